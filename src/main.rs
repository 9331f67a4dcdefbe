pub mod ast;
pub mod cli;
pub mod convert;
pub mod diag;
pub mod flow;
pub mod parser;
pub mod printer;
pub mod rewrite;
pub mod symbols;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
