//! Canonical column names shared by every stage.

pub const REGION_CODE: &str = "region_code";
pub const REGION_NAME: &str = "region_name";
pub const DEPARTMENT_CODE: &str = "department_code";
pub const DEPARTMENT_NAME: &str = "department_name";

pub const TOWN_CODE: &str = "town_code";
pub const TOWN_NAME: &str = "town_name";
pub const REGISTERED: &str = "registered_count";
pub const ABSTENTIONS: &str = "abstentions";
pub const NULL_VOTES: &str = "null_votes";
pub const CHOICE_A: &str = "choice_a_votes";
pub const CHOICE_B: &str = "choice_b_votes";

pub const RATIO: &str = "ratio";

/// Referendum columns in file order. Raw headers are overwritten with these.
pub const BALLOT_COLUMNS: [&str; 9] = [
    DEPARTMENT_CODE,
    DEPARTMENT_NAME,
    TOWN_CODE,
    TOWN_NAME,
    REGISTERED,
    ABSTENTIONS,
    NULL_VOTES,
    CHOICE_A,
    CHOICE_B,
];

/// Ballot columns holding vote counts.
pub const COUNT_COLUMNS: [&str; 5] = [REGISTERED, ABSTENTIONS, NULL_VOTES, CHOICE_A, CHOICE_B];

/// Area table columns, presentation order.
pub const AREA_COLUMNS: [&str; 4] = [REGION_CODE, REGION_NAME, DEPARTMENT_CODE, DEPARTMENT_NAME];
