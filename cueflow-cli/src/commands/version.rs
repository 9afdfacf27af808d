//! Version command - show version information.

use anyhow::Result;
use cueflow_core::settings::EngineSettings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command.
pub fn run(settings: &EngineSettings) -> Result<()> {
    println!("cueflow - interactive graphics automation engine");
    println!();
    println!("Version:     {}", VERSION);
    println!(
        "Platform:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!();
    println!("Components:");
    println!("  cueflow-core     Addresses, runtime store, context, collaborators");
    println!("  cueflow-script   Sandboxed expression and script engine");
    println!("  cueflow-actions  Ordered action lists");
    println!("  cueflow-graph    Node graph validation and dispatch");
    println!();
    println!("Effective limits:");
    println!("  expression timeout  {} ms", settings.expression_timeout_ms);
    println!("  script timeout      {} ms", settings.script_timeout_ms);
    println!("  loop iterations     {}", settings.max_loop_iterations);
    println!("  call depth          {}", settings.max_call_depth);
    println!("  longest delay       {} ms", settings.max_delay_ms);
    println!("  dispatch mode       {:?}", settings.dispatch_mode);

    Ok(())
}
