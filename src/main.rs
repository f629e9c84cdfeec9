use clap::Parser;

fn main() -> anyhow::Result<()> {
    keyscope::logging::init_tracing();
    keyscope::app::run(keyscope::cli::Args::parse())
}
