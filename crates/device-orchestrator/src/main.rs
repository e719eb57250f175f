pub mod config;
pub mod console;
pub mod orchestrator;
pub mod probe;
pub mod simulate;

trait ToolRun {
    fn run(&self) -> anyhow::Result<()>;
}

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct OrchestratorOptions {
    #[command(subcommand)]
    command: OrchestratorCommand,
}

#[derive(clap::Subcommand, Debug)]
enum OrchestratorCommand {
    /// Apply one `k1=v1;k2=v2` configuration string and exit.
    Apply(ApplyOpts),
    /// Interactive bring-up REPL against the tuner.
    Console(console::ConsoleOpts),
    /// List candidate serial ports.
    ListPorts(probe::ListPortsOpts),
    /// Probe a serial port for a responding DMHD-1000.
    Probe(probe::ProbeOpts),
    /// Run an in-process fake DMHD-1000 over TCP loopback.
    Simulate(simulate::SimulateOpts),
}

impl ToolRun for OrchestratorCommand {
    fn run(&self) -> anyhow::Result<()> {
        use OrchestratorCommand::*;
        match self {
            Apply(o) => o.run(),
            Console(o) => o.run(),
            ListPorts(o) => o.run(),
            Probe(o) => o.run(),
            Simulate(o) => o.run(),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ApplyOpts {
    /// Configuration string, e.g. "card=1;hfp_enable=true"
    config: String,
}

impl ToolRun for ApplyOpts {
    fn run(&self) -> anyhow::Result<()> {
        let mut orchestrator = orchestrator::Orchestrator::new();
        orchestrator.apply(&self.config)?;
        println!("applied: {}", self.config);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    use clap::Parser;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = OrchestratorOptions::parse();
    opts.command.run()
}
