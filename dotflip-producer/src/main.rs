use anyhow::{Context, Result};
use clap::Parser;
use dotflip_core::{Grid, util};
use dotflip_producer::cli::Cli;
use dotflip_producer::session::spawn_generator;
use dotflip_producer::{Canvas, FrameChannel, ProducerSession, SharedCanvas};

#[tokio::main]
async fn main() -> Result<()> {
    util::init_tracing();
    util::install_panic_hook();

    let cli = Cli::parse();
    let canvas = SharedCanvas::new(Canvas {
        grid: Grid::new(cli.geometry()),
        transform: cli.transform(),
    });
    {
        let canvas = canvas.lock();
        tracing::info!(
            url = %cli.url,
            pattern = ?cli.pattern,
            "Grid size: {}x{}",
            canvas.grid.cols(),
            canvas.grid.rows()
        );
    }

    let generator = spawn_generator(
        canvas.clone(),
        cli.pattern.generator(),
        cli.generator_period(),
    );

    let session = ProducerSession::new(canvas)
        .with_period(cli.period())
        .with_listen(cli.listen);
    let result = session
        .run(FrameChannel::open(cli.url.clone()), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    generator.abort();
    result.with_context(|| format!("session with {} ended", cli.url))
}
