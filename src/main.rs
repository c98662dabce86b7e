use anyhow::Result;
use autodevops::cli::App;

#[tokio::main]
async fn main() -> Result<()> {
    let (mut app, args) = App::from_args()?;

    app.run(args).await?;

    Ok(())
}
