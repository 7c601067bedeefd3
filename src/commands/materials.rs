//! Materials command handler: print the resolved materials of a course.

use std::fmt::Write as _;

use anyhow::Result;
use lecture_core::{Credential, LectureService, Material};

use super::resolve_listing;

pub async fn run_materials_command(
    service: &LectureService,
    credential: &Credential,
    course_id: &str,
) -> Result<()> {
    let materials = resolve_listing(service, credential, course_id).await?;
    print!("{}", render_materials(&materials));
    Ok(())
}

fn render_materials(materials: &[Material]) -> String {
    if materials.is_empty() {
        return "No materials found.\n".to_string();
    }
    let mut out = String::new();
    for (index, material) in materials.iter().enumerate() {
        let _ = writeln!(out, "{index:>4}  {:<8}  {}", material.kind, material.name);
    }
    out
}
