use sweep_cli::{command, init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = command().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let output = run(&matches).await?;
    println!("{output}");
    Ok(())
}
