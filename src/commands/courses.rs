//! Courses command handler: print the course catalog grouped by term.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use lecture_core::{Credential, LectureService, SemesterMap};

pub async fn run_courses_command(service: &LectureService, credential: &Credential) -> Result<()> {
    let semesters = service
        .list_courses(credential)
        .await
        .context("failed to list courses")?;
    print!("{}", render_semesters(&semesters));
    Ok(())
}

/// Newest term first; courses keep catalog order.
fn render_semesters(semesters: &SemesterMap) -> String {
    if semesters.is_empty() {
        return "No courses found.\n".to_string();
    }
    let mut out = String::new();
    for (term, courses) in semesters.iter().rev() {
        let _ = writeln!(out, "{term}");
        for course in courses {
            let _ = writeln!(out, "  {:>8}  {}", course.id, course.name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lecture_core::{Course, Term, TermPeriod};

    #[test]
    fn test_render_semesters_newest_first() {
        let mut semesters = SemesterMap::new();
        let spring = Term::new(2024, TermPeriod::First);
        let fall = Term::new(2024, TermPeriod::Second);
        semesters.insert(
            spring,
            vec![Course {
                id: "101".to_string(),
                name: "Calculus".to_string(),
                term: spring,
            }],
        );
        semesters.insert(
            fall,
            vec![Course {
                id: "202".to_string(),
                name: "운영체제".to_string(),
                term: fall,
            }],
        );

        let rendered = render_semesters(&semesters);
        assert_eq!(
            rendered,
            "2024년 2학기\n       202  운영체제\n2024년 1학기\n       101  Calculus\n"
        );
    }

    #[test]
    fn test_render_empty_catalog() {
        assert_eq!(render_semesters(&SemesterMap::new()), "No courses found.\n");
    }
}
