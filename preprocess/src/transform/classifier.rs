//! Core / outlet classification of inventory rows.

use crate::models::OperationGroup;

/// Operation bases that always count as core.
pub const CORE_BASES: [&str; 2] = ["INTRO", "FOCUS"];

/// Classify a row from its operation basis (`运营基准`) and season (`产品季节`).
///
/// `INTRO`/`FOCUS` rows are core. Rows without a basis are core when their
/// season contains one of `core_seasons`. Everything else is outlet.
pub fn determine_operation_group<S: AsRef<str>>(
    operation_basis: &str,
    season: &str,
    core_seasons: &[S],
) -> OperationGroup {
    let basis = operation_basis.trim();
    let season = season.trim();

    if CORE_BASES.contains(&basis) {
        return OperationGroup::Core;
    }

    if basis.is_empty() && core_seasons.iter().any(|tag| season.contains(tag.as_ref())) {
        return OperationGroup::Core;
    }

    OperationGroup::Outlet
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEASONS: [&str; 4] = ["24FW", "25SS", "25FW", "26SS"];

    #[test]
    fn test_intro_and_focus_are_core_regardless_of_season() {
        for basis in ["INTRO", "FOCUS", " FOCUS "] {
            for season in ["", "19SS", "25SS", "N/A"] {
                assert_eq!(determine_operation_group(basis, season, &SEASONS), OperationGroup::Core);
            }
        }
    }

    #[test]
    fn test_blank_basis_uses_season_tags() {
        assert_eq!(determine_operation_group("", "24FW", &SEASONS), OperationGroup::Core);
        assert_eq!(determine_operation_group("  ", "MLB 25SS NEW", &SEASONS), OperationGroup::Core);
        assert_eq!(determine_operation_group("", "24SS", &SEASONS), OperationGroup::Outlet);
        assert_eq!(determine_operation_group("", "", &SEASONS), OperationGroup::Outlet);
    }

    #[test]
    fn test_other_basis_is_outlet_even_with_core_season() {
        assert_eq!(determine_operation_group("CARRY", "25FW", &SEASONS), OperationGroup::Outlet);
        assert_eq!(determine_operation_group("intro", "25FW", &SEASONS), OperationGroup::Outlet);
    }

    #[test]
    fn test_empty_season_list() {
        let none: [&str; 0] = [];
        assert_eq!(determine_operation_group("", "25FW", &none), OperationGroup::Outlet);
    }
}
