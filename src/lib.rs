//! Dart tournament engine: library with models, tournament logic and the per-tournament store.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    adjust_legs, authorize, bracket_size, build_bracket, complete_match, compute_standings,
    correct_score, edit_tournament, force_complete_match, generate_groups, group_qualifiers,
    plan_group_sizes, record_legs, reset_match, round_robin_pairings, select_qualifiers,
    standard_line_order, start_match, start_playoffs, start_tournament, tournament_standings,
    validate_result, AdminAction, AdminCapability, AuditEntry, AuditLog, Authorizer,
    CompletionOutcome, HeadToHead, Standing, StaticAdmins, TournamentEdit,
};
pub use models::{
    AdvanceCount, BracketRound, Bye, GameMatch, Group, GroupId, GroupMatchup, GroupingMode,
    MatchId, MatchLocation, MatchResult, MatchState, Player, PlayerId, PlayerStats,
    PlayoffBracket, Qualifier, SeedingPolicy, Side, Slot, Stage, Tournament, TournamentConfig,
    TournamentError, TournamentId, TournamentStatus,
};
pub use store::{TournamentEntry, TournamentStore};
