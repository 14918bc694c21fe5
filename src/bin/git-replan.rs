use clap::Parser;
use log::LevelFilter;

use git_replan::app::App;
use git_replan::cli::Cli;
use git_replan::editor::SystemEditor;
use git_replan::features::Features;

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_target(false)
        .format_timestamp(None)
        .init();

    // Environment first, then CLI overrides
    let features = Features::from_env().with_overrides(cli.features.as_deref());
    Features::init_global(features);

    let mut app = App::new(SystemEditor::new());
    if let Err(err) = app.run(cli.command) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
