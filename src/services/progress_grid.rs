// src/services/progress_grid.rs

use chrono::{DateTime, Datelike, Utc};

use crate::models::objective::{MonthCell, Objective};

/// Grade mensal do objetivo: todo mês de `created_at` até `deadline`
/// (inclusive), marcando se tem log, se já passou e se é o mês corrente.
///
/// Visão derivada, nada aqui é salvo.
pub fn build_progress_grid(objective: &Objective, now: DateTime<Utc>) -> Vec<MonthCell> {
    let (mut year, mut month) = (objective.created_at.year(), objective.created_at.month());
    let end = (objective.deadline.year(), objective.deadline.month());
    let current = (now.year(), now.month());

    let mut cells = Vec::new();
    while (year, month) <= end {
        let has_log = objective
            .progress_logs
            .iter()
            .any(|l| l.year == year && l.month == month as i32);

        cells.push(MonthCell {
            month,
            year,
            has_log,
            is_past: (year, month) < current,
            is_current: (year, month) == current,
        });

        // Dezembro → Janeiro do ano seguinte
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::objective::{ProgressLog, ValueType};
    use crate::services::objective_engine::tests::{date, objective};
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn spanning(created: (i32, u32, u32), deadline: (i32, u32, u32)) -> Objective {
        let mut o = objective(ValueType::Quantity, 10);
        o.created_at = Utc.with_ymd_and_hms(created.0, created.1, created.2, 12, 0, 0).unwrap();
        o.deadline = date(deadline.0, deadline.1, deadline.2);
        o
    }

    #[test]
    fn grid_rolls_over_the_year() {
        let o = spanning((2024, 11, 1), (2025, 2, 15));
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();

        let months: Vec<(u32, i32)> = build_progress_grid(&o, now)
            .iter()
            .map(|c| (c.month, c.year))
            .collect();

        assert_eq!(months, vec![(11, 2024), (12, 2024), (1, 2025), (2, 2025)]);
    }

    #[test]
    fn grid_flags_past_current_and_logged_months() {
        let mut o = spanning((2024, 11, 1), (2025, 2, 15));
        o.progress_logs.push(ProgressLog {
            id: Uuid::new_v4(),
            objective_id: o.id,
            month: 12,
            year: 2024,
            value: Decimal::ONE,
            description: None,
        });
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();

        let grid = build_progress_grid(&o, now);

        assert!(grid[0].is_past && !grid[0].has_log);
        assert!(grid[1].is_past && grid[1].has_log);
        assert!(grid[2].is_current && !grid[2].is_past);
        assert!(!grid[3].is_past && !grid[3].is_current);
    }

    #[test]
    fn single_month_objective_has_one_cell() {
        let o = spanning((2025, 3, 2), (2025, 3, 28));
        let grid = build_progress_grid(&o, Utc::now());
        assert_eq!(grid.len(), 1);
        assert_eq!((grid[0].month, grid[0].year), (3, 2025));
    }

    #[test]
    fn deadline_before_creation_yields_empty_grid() {
        let o = spanning((2025, 5, 1), (2025, 2, 1));
        assert!(build_progress_grid(&o, Utc::now()).is_empty());
    }
}
