mod tables;

pub use self::tables::{
    issues as print_issues, ranking as print_ranking, score_details as print_score_details,
    stages as print_stage_report,
};
