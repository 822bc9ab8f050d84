mod panel;

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use backlit::{Backlight, BacklitConfig, BacklitError};
use clap::Parser;
use log::debug;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::panel::{Command, HELP, Panel};

/// View and adjust display backlight brightness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Device to start on. Defaults to the first one found.
    #[arg(long, value_name = "name")]
    device: Option<String>,

    /// Regular expression restricting which devices are offered
    #[arg(long, value_name = "regex", default_value_t = String::from("."))]
    filter: String,

    /// Config file to use instead of $XDG_CONFIG_HOME/backlit/config.toml
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,

    /// Print the discovered devices and exit.
    #[arg(long)]
    list: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), BacklitError> {
    let config = match &args.config {
        Some(path) => BacklitConfig::from_path(path).await?,
        None => BacklitConfig::new().await?,
    };
    debug!("{:?}", config);
    let backlight = Backlight::new(config);

    let devices = backlight.list_devices_matching(&args.filter).await?;
    if args.list {
        for device in &devices {
            println!("{device}");
        }
        return Ok(());
    }

    let mut panel = Panel::new(&backlight, devices, args.device.as_deref()).await?;
    interact(&backlight, &mut panel).await
}

async fn interact(backlight: &Backlight, panel: &mut Panel) -> Result<(), BacklitError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", panel.render());
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            Command::Redraw => {}
            Command::List => {
                println!("{}", panel.render_devices());
                continue;
            }
            Command::Select(device) => {
                if !panel.select(backlight, &device).await {
                    eprintln!("No backlight device '{device}'");
                    continue;
                }
            }
            Command::Load => panel.load(backlight).await,
            Command::Set(value) => panel.set_value(value),
            Command::Percent(percent) => panel.set_percent(percent),
            Command::Up => panel.step_up(),
            Command::Down => panel.step_down(),
            Command::Confirm => match panel.confirm(backlight).await {
                Ok(()) => println!("Set {} to {}", panel.device(), panel.value()),
                Err(e) => eprintln!("Error: {e}"),
            },
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => return Ok(()),
        }
        println!("{}", panel.render());
    }
}
