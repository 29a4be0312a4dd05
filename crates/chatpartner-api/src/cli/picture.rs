//! `chatpartner picture`: one image from the command line.

use console::style;

use crate::state::AppState;

/// Generate an image from the joined prompt words and print where it landed.
pub async fn create_picture(state: &AppState, prompt: &[String]) -> anyhow::Result<()> {
    let pictures = state.picture_service()?;
    let prompt = prompt.join(" ");

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message("drawing...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    let result = pictures.create(&prompt).await;
    spinner.finish_and_clear();

    let image = result?;
    println!(
        "  {} Image saved to {}",
        style("✓").green().bold(),
        style(image.path.display()).cyan()
    );
    Ok(())
}
