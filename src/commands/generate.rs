//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Folio;

/// Fetch all content and write the static site
pub async fn run(folio: &Folio) -> Result<()> {
    let start = std::time::Instant::now();

    folio.config.validate()?;

    let generator = Generator::new(folio)?;
    let stats = generator.generate().await?;

    if !stats.index_loaded {
        tracing::warn!("Post index could not be loaded; blog pages were generated empty");
    }

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts ({} skipped) in {:.2}s",
        stats.posts,
        stats.skipped,
        duration.as_secs_f64()
    );

    Ok(())
}
