use uuid::Uuid;

use super::models::Candidate;
use crate::errors::AppError;

/// The results table of one workspace.
#[derive(Debug, Clone, Default)]
pub struct CandidateBoard {
    rows: Vec<Candidate>,
}

impl CandidateBoard {
    pub fn new(rows: Vec<Candidate>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Candidate] {
        &self.rows
    }

    pub fn shortlisted(&self) -> impl Iterator<Item = &Candidate> {
        self.rows.iter().filter(|c| c.shortlisted)
    }

    /// Flips the shortlist flag of exactly one row and returns its new state.
    pub fn toggle_shortlist(&mut self, id: Uuid) -> Result<&Candidate, AppError> {
        let candidate = self
            .rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
        candidate.shortlisted = !candidate.shortlisted;
        Ok(candidate)
    }
}

/// Message shown to the user after a shortlist toggle.
pub fn shortlist_notification(candidate: &Candidate) -> String {
    if candidate.shortlisted {
        format!("{} added to shortlist", candidate.name)
    } else {
        format!("{} removed from shortlist", candidate.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::fixtures::sample_candidates;

    fn board() -> CandidateBoard {
        CandidateBoard::new(sample_candidates().unwrap())
    }

    #[test]
    fn test_toggle_flips_exactly_one_row() {
        let mut board = board();
        let before: Vec<bool> = board.rows().iter().map(|c| c.shortlisted).collect();
        let target = board.rows()[1].id;

        let toggled = board.toggle_shortlist(target).unwrap();
        assert!(toggled.shortlisted);

        for (i, row) in board.rows().iter().enumerate() {
            if row.id == target {
                assert_ne!(row.shortlisted, before[i]);
            } else {
                assert_eq!(row.shortlisted, before[i]);
            }
        }
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut board = board();
        let target = board.rows()[0].id;
        board.toggle_shortlist(target).unwrap();
        board.toggle_shortlist(target).unwrap();
        assert_eq!(board.shortlisted().count(), 0);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut board = board();
        assert!(matches!(
            board.toggle_shortlist(Uuid::new_v4()).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_notification_text() {
        let mut board = board();
        let target = board.rows()[0].id;
        let added = shortlist_notification(board.toggle_shortlist(target).unwrap());
        assert_eq!(added, "John Smith added to shortlist");
        let removed = shortlist_notification(board.toggle_shortlist(target).unwrap());
        assert_eq!(removed, "John Smith removed from shortlist");
    }
}
