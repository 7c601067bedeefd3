//! Download command handler: fetch selected materials with per-row progress.

use std::sync::Arc;

use anyhow::{Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use lecture_core::{Credential, DownloadRequest, LectureService, Material};
use tracing::info;

use super::resolve_listing;
use crate::cli::DownloadArgs;

const BAR_TEMPLATE: &str = "{bar:30.cyan/blue} {pos:>3}% {msg}";

/// Downloads the selected materials. Returns `true` when every row succeeded.
pub async fn run_download_command(
    service: &LectureService,
    credential: &Credential,
    args: &DownloadArgs,
    show_progress: bool,
) -> Result<bool> {
    let materials = resolve_listing(service, credential, &args.course).await?;
    let selected = select(materials, &args.only)?;
    if selected.is_empty() {
        println!("Nothing to download.");
        return Ok(true);
    }

    let multi = if show_progress && !args.no_progress {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    };
    let style = ProgressStyle::with_template(BAR_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());

    let mut bars = Vec::with_capacity(selected.len());
    let requests: Vec<DownloadRequest> = selected
        .into_iter()
        .map(|material| {
            let bar = multi.add(ProgressBar::new(100));
            bar.set_style(style.clone());
            bar.set_message(material.name.clone());
            bars.push(bar.clone());
            DownloadRequest::new(material)
                .with_progress(Arc::new(move |percent| bar.set_position(u64::from(percent))))
        })
        .collect();

    info!(count = requests.len(), dest = %args.dest.display(), "downloading");
    let outcomes = service.download(requests, &args.dest).await;

    for bar in &bars {
        bar.finish_and_clear();
    }
    let mut all_ok = true;
    for outcome in &outcomes {
        all_ok &= outcome.success();
        println!("{:>12}  {}", outcome.status_text(), outcome.name);
    }
    Ok(all_ok)
}

/// Keeps the materials at `only` (all of them when empty), in index order.
fn select(materials: Vec<Material>, only: &[usize]) -> Result<Vec<Material>> {
    if only.is_empty() {
        return Ok(materials);
    }
    if let Some(bad) = only.iter().find(|&&index| index >= materials.len()) {
        bail!(
            "material index {bad} out of range (course has {} materials)",
            materials.len()
        );
    }
    Ok(materials
        .into_iter()
        .enumerate()
        .filter(|(index, _)| only.contains(index))
        .map(|(_, material)| material)
        .collect())
}
