use crate::utils::*;
use gloo::timers::callback::Timeout;
use rand::{SeedableRng, rngs::SmallRng};
use sorte_core::{self as game, AutoStop, AutoTick, PAY_ROW, SlotGame, SpinReport};
use yew::prelude::*;

const BET_STEP: game::Amount = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Spin,
    ToggleAuto,
    AutoFire,
    AdjustBet(game::Amount),
    ToggleExport,
    Reset,
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct SlotProps {
    pub seed: u64,
}

pub(crate) struct SlotView {
    game: SlotGame,
    rng: SmallRng,
    grid: Option<game::Grid>,
    message: String,
    show_export: bool,
    /// Pending auto-play tick. Dropping it cancels the tick.
    auto_timer: Option<Timeout>,
}

impl SlotView {
    fn schedule_auto_tick(&mut self, ctx: &Context<Self>) {
        let link = ctx.link().clone();
        let interval = self.game.auto().interval_ms();
        self.auto_timer = Some(Timeout::new(interval, move || {
            link.send_message(Msg::AutoFire)
        }));
    }

    fn show_report(&mut self, report: &SpinReport) {
        self.grid = Some(report.grid);
        self.message = if report.wins.is_empty() {
            "No win this time.".to_string()
        } else {
            format!("You won {:.2}!", report.payout)
        };
    }

    fn export_text(&self) -> String {
        let mut text = String::from("time,pay_row,bet,payout,net,balance\n");
        for row in self.game.export_history() {
            text.push_str(&format!(
                "{},{},{:.2},{:.2},{:.2},{:.2}\n",
                row.time, row.pay_row, row.bet, row.payout, row.net, row.balance
            ));
        }
        text
    }
}

impl Component for SlotView {
    type Message = Msg;
    type Properties = SlotProps;

    fn create(ctx: &Context<Self>) -> Self {
        Self {
            game: game::load_or_default(&LocalStore),
            rng: SmallRng::seed_from_u64(ctx.props().seed),
            grid: None,
            message: String::new(),
            show_export: false,
            auto_timer: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        let mutated = match msg {
            Spin => {
                match self.game.spin(&mut self.rng, utc_now()) {
                    Ok(report) => self.show_report(&report),
                    Err(err) => self.message = err.to_string(),
                }
                true
            }
            ToggleAuto => {
                match self.game.toggle_auto() {
                    Ok(true) => self.schedule_auto_tick(ctx),
                    Ok(false) => self.auto_timer = None,
                    Err(err) => self.message = err.to_string(),
                }
                false
            }
            AutoFire => {
                self.auto_timer = None;
                let tick = self.game.auto_tick(&mut self.rng, utc_now());
                if let Some(report) = tick.report() {
                    self.show_report(report);
                }
                match tick {
                    AutoTick::Continue(_) => self.schedule_auto_tick(ctx),
                    AutoTick::Stop {
                        reason: AutoStop::InsufficientFunds,
                        ..
                    } => self.message.push_str(" Auto-play stopped: balance below bet."),
                    AutoTick::Stop { .. } => {}
                }
                true
            }
            AdjustBet(delta) => {
                self.game.adjust_bet(delta);
                true
            }
            ToggleExport => {
                self.show_export = !self.show_export;
                false
            }
            Reset => {
                self.auto_timer = None;
                self.game.reset();
                self.grid = None;
                self.message = "Credits reset.".to_string();
                true
            }
        };

        if mutated {
            game::save(&mut LocalStore, &self.game);
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        use Msg::*;

        let link = ctx.link();
        let auto_label = if self.game.auto().is_enabled() {
            "Stop auto"
        } else {
            "Auto"
        };

        html! {
            <section class="slot">
                <h2>{"Slot Machine"}</h2>
                <table class="reels">
                    {
                        for (0..game::ROWS).map(|row| html! {
                            <tr class={(row == PAY_ROW).then_some("pay-row")}>
                                {
                                    for (0..game::COLS).map(|col| {
                                        let glyph = self.grid.map_or("❔", |grid| grid[row][col].glyph());
                                        html! { <td>{glyph}</td> }
                                    })
                                }
                            </tr>
                        })
                    }
                </table>
                <nav>
                    <button onclick={link.callback(|_| AdjustBet(-BET_STEP))}>{"−"}</button>
                    <span class="bet">{format!("Bet {:.2}", self.game.bet())}</span>
                    <button onclick={link.callback(|_| AdjustBet(BET_STEP))}>{"+"}</button>
                    <button disabled={!self.game.can_spin()} onclick={link.callback(|_| Spin)}>{"Spin"}</button>
                    <button onclick={link.callback(|_| ToggleAuto)}>{auto_label}</button>
                    <button onclick={link.callback(|_| ToggleExport)}>{"Export"}</button>
                    <button onclick={link.callback(|_| Reset)}>{"Reset"}</button>
                </nav>
                <p class="balance">{format!("Credits: {:.2}", self.game.balance())}</p>
                <p class="message">{self.message.clone()}</p>
                <pre class="chart">{sparkline(self.game.series().iter(), 60)}</pre>
                if self.show_export {
                    <textarea readonly={true} value={self.export_text()}/>
                }
                <ol class="history">
                    {
                        for self.game.history().iter().take(20).map(|record| html! {
                            <li>{format!(
                                "{} | {} | {} | balance:{:.2}",
                                record.time.format("%H:%M:%S"),
                                record.grid[PAY_ROW].iter().map(|symbol| symbol.glyph()).collect::<String>(),
                                record.label,
                                record.balance_after,
                            )}</li>
                        })
                    }
                </ol>
            </section>
        }
    }
}
