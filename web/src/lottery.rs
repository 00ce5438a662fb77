use crate::utils::*;
use rand::{SeedableRng, rngs::SmallRng};
use sorte_core::{self as game, Difficulty, LotteryGame, LotteryPhase, StartParams};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    BetInput(String),
    BalanceInput(String),
    DifficultyInput(String),
    Start,
    Play,
    ResetHistory,
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct LotteryProps {
    pub seed: u64,
}

pub(crate) struct LotteryView {
    game: LotteryGame,
    rng: SmallRng,
    bet_input: String,
    balance_input: String,
    difficulty_input: String,
    result: String,
    message: String,
}

impl LotteryView {
    fn prefill(params: StartParams) -> (String, String, String) {
        (
            format!("{:.0}", params.bet),
            format!("{:.0}", params.balance),
            params.difficulty.name().to_string(),
        )
    }

    fn play(&mut self) {
        match self.game.play(&mut self.rng, utc_now()) {
            Ok(report) => {
                let outcome = report.outcome;
                self.result = format!(
                    "Number: {} | {} ({})",
                    outcome.number,
                    outcome.label,
                    signed(outcome.delta, 0)
                );
                self.message = if report.depleted {
                    "You ran out of coins. Restart the game to play again.".to_string()
                } else {
                    format!("Last play: {}", utc_now().format("%H:%M:%S"))
                };
            }
            Err(err) => {
                log::debug!("play refused: {}", err);
                self.message = err.to_string();
            }
        }
    }
}

/// Clears the play log once the player has confirmed, returning whether anything changed.
fn clear_history(game: &mut LotteryGame, confirmed: bool) -> bool {
    if confirmed {
        game.reset_history();
    }
    confirmed
}

impl Component for LotteryView {
    type Message = Msg;
    type Properties = LotteryProps;

    fn create(ctx: &Context<Self>) -> Self {
        let game: LotteryGame = game::load_or_default(&LocalStore);
        let (bet_input, balance_input, difficulty_input) = Self::prefill(game.start_params());
        Self {
            game,
            rng: SmallRng::seed_from_u64(ctx.props().seed),
            bet_input,
            balance_input,
            difficulty_input,
            result: String::new(),
            message: String::new(),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        let mutated = match msg {
            BetInput(value) => {
                self.bet_input = value;
                false
            }
            BalanceInput(value) => {
                self.balance_input = value;
                false
            }
            DifficultyInput(value) => {
                self.difficulty_input = value;
                false
            }
            Start => {
                let params = StartParams::from_inputs(
                    &self.bet_input,
                    &self.balance_input,
                    &self.difficulty_input,
                );
                self.game.start(params);
                (self.bet_input, self.balance_input, self.difficulty_input) = Self::prefill(params);
                self.result = "Game started, press Play!".to_string();
                self.message.clear();
                true
            }
            Play => {
                self.play();
                true
            }
            ResetHistory => clear_history(&mut self.game, gloo::dialogs::confirm("Clear history?")),
        };

        if mutated {
            game::save(&mut LocalStore, &self.game);
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        use Msg::*;

        let link = ctx.link();
        let on_bet = link.callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            BetInput(input.value())
        });
        let on_balance = link.callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            BalanceInput(input.value())
        });
        let on_difficulty = link.callback(|e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            DifficultyInput(select.value())
        });
        let can_play = matches!(self.game.phase(), LotteryPhase::Running) && self.game.balance() > 0.0;
        let difficulty = Difficulty::parse(&self.difficulty_input).unwrap_or_default();

        html! {
            <section class="lottery">
                <h2>{"Lucky Number"}</h2>
                <div class="controls">
                    <label>{"Bet"}<input type="number" min="1" value={self.bet_input.clone()} oninput={on_bet}/></label>
                    <label>{"Starting balance"}<input type="number" min="1" value={self.balance_input.clone()} oninput={on_balance}/></label>
                    <label>{"Difficulty"}
                        <select onchange={on_difficulty}>
                            {
                                for Difficulty::ALL.into_iter().map(|option| html! {
                                    <option value={option.name()} selected={option == difficulty}>{option.name()}</option>
                                })
                            }
                        </select>
                    </label>
                    <button type="button" onclick={link.callback(|_| Start)}>{"Start"}</button>
                    <button type="button" disabled={!can_play} onclick={link.callback(|_| Play)}>{"Play"}</button>
                    <button type="button" onclick={link.callback(|_| ResetHistory)}>{"Clear history"}</button>
                </div>
                <p class="balance">{format!("💰 Balance: {:.0} coins", self.game.balance())}</p>
                <p class="odds">{difficulty.odds_summary()}</p>
                <output>{self.result.clone()}</output>
                <p class="message">{self.message.clone()}</p>
                <pre class="chart">{sparkline(self.game.series().iter(), 60)}</pre>
                <ol class="history">
                    {
                        for self.game.history().iter().map(|record| html! {
                            <li>{format!(
                                "{} | num:{} | {} | {} | balance:{:.0}",
                                record.time.format("%H:%M:%S"),
                                record.number,
                                record.label,
                                signed(record.delta, 0),
                                record.balance_after,
                            )}</li>
                        })
                    }
                </ol>
            </section>
        }
    }
}
