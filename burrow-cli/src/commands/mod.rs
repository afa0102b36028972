use anyhow::Result;

use crate::cli::Commands;

pub mod init;
pub mod namespaces;
pub mod run;

/// Dispatch command to appropriate handler, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run(args) => run::execute(args).await,

        Commands::Init(args) => init::execute(args).await,

        Commands::Namespaces { pid } => namespaces::execute(pid),
    }
}
