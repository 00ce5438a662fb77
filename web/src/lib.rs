use clap::Parser;
use wasm_bindgen::prelude::*;
use yew::prelude::*;

mod lottery;
mod slot;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,
}

#[derive(Properties, Clone, PartialEq)]
struct AppProps {
    seed: u64,
}

#[function_component]
fn App(props: &AppProps) -> Html {
    // distinct streams so both games do not mirror each other under a forced seed
    let lottery_seed = props.seed;
    let slot_seed = props.seed.rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15;
    html! {
        <main class="sorte">
            <lottery::LotteryView seed={lottery_seed}/>
            <slot::SlotView seed={slot_seed}/>
        </main>
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window()
        .location()
        .hash()
        .unwrap_or_else(|_| "".to_string());

    let args = Args::try_parse_from(location_hash.split(['#', '&'])).expect("Could not parse args");
    if let Some(log_level) = args.verbose.log_level() {
        console_log::init_with_level(log_level).expect("Error initializing logger");
    }
    log::debug!("seed: {:?}", args.seed);

    let seed = args.seed.unwrap_or_else(utils::js_random_seed);
    let root = document()
        .get_element_by_id("game")
        .expect("Could not find id=\"game\" element");

    log::debug!("App started");
    yew::Renderer::<App>::with_root_and_props(root, AppProps { seed }).render();
}
