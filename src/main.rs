use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    stackc::driver::main()
}
