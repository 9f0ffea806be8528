pub mod chart;
pub mod console;
pub mod format;
pub mod models;
pub mod period;
pub mod report;
pub mod status;
pub mod template;

pub use chart::{ChartArtifact, ChartRenderer, Series, SeriesPoint, SvgBarChart};
pub use console::{Console, ConsoleOutput};
pub use format::{clock_duration, elapsed_time, human_duration, human_size, size_in_unit};
pub use models::{ClientRow, JobRow};
pub use period::{DayBucket, last_days_intervals, last_days_intervals_at};
pub use report::{
    BackupJobReport, DayTotal, JobListPage, JobListRequest, JobView, ReportAssembler,
    StoredSeries,
};
pub use status::{Classification, JobLevel, StatusCategory, StatusIcon, classify};
pub use template::TemplateContext;
