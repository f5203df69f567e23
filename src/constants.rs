pub const REPORT_PATH: &str = "analysis_output.txt";
pub const BLOCK_DELIMITER: &str = "--------------------";
pub const TITLE_RULE_WIDTH: usize = 60;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;
pub const FETCH_PERIOD: &str = "1mo";
pub const FETCH_INTERVAL: &str = "15m";
pub const DAILY_INTERVAL: &str = "1d";
pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

pub const DEFAULT_ROLE_THRESHOLD: f64 = 1.0;

pub const DISCORD_PACK_LIMIT: usize = 1_900;
pub const DISCORD_HARD_LIMIT: usize = 2_000;
pub const LINE_PACK_LIMIT: usize = 1_500;
pub const LINE_HARD_LIMIT: usize = 2_000;
pub const LINE_REPORT_TITLE: &str = "【天才投資家レポート】";
pub const LINE_PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";
pub const DISPATCH_PACING_MS: u64 = 1_000;

pub const VALIDATION_SYMBOLS: [&str; 5] = ["NVDA", "XOM", "CAT", "UBER", "SPY"];
pub const VALIDATION_TOLERANCE: f64 = 0.01;
