//! Tournament business logic: setup, group play, standings, playoffs and admin corrections.

mod admin;
mod bracket;
mod group_play;
mod playoffs;
mod propagation;
mod qualifiers;
mod setup;
mod standings;

pub use admin::{
    adjust_legs, authorize, correct_score, edit_tournament, force_complete_match, reset_match,
    AdminAction, AdminCapability, AuditEntry, AuditLog, Authorizer, StaticAdmins, TournamentEdit,
};
pub use bracket::{bracket_size, build_bracket, standard_line_order};
pub use group_play::{generate_groups, plan_group_sizes, round_robin_pairings};
pub use playoffs::start_playoffs;
pub use propagation::{complete_match, record_legs, start_match, validate_result, CompletionOutcome};
pub use qualifiers::{group_qualifiers, select_qualifiers};
pub use setup::start_tournament;
pub use standings::{compute_standings, tournament_standings, HeadToHead, Standing};
