//! CLI command handlers.

mod courses;
mod download;
mod login;
mod materials;

pub use courses::run_courses_command;
pub use download::run_download_command;
pub use login::sign_in;
pub use materials::run_materials_command;

use anyhow::{Context, Result};
use lecture_core::{Credential, LectureService, Material};

/// Resolves a course's materials in a stable order so printed indexes can
/// be passed back to `download --only`.
pub(crate) async fn resolve_listing(
    service: &LectureService,
    credential: &Credential,
    course_id: &str,
) -> Result<Vec<Material>> {
    let mut materials = service
        .resolve_course_id(credential, course_id)
        .await
        .with_context(|| format!("failed to resolve materials of course {course_id}"))?;
    sort_listing(&mut materials);
    Ok(materials)
}

fn sort_listing(materials: &mut [Material]) {
    materials.sort_by(|left, right| left.name.cmp(&right.name).then_with(|| left.url.cmp(&right.url)));
}
