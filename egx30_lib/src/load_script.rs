//! Load script generation: a parameterized HiveQL builder.
//!
//! Every interpolated value is either a validated [`Identifier`] or an
//! escaped [`Literal`]; raw strings never reach the rendered script.
//! The statement order makes reruns for the same date idempotent: the
//! date's partition is dropped before the staging rows are inserted.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::artifacts::{write_artifact, ArtifactLayout, LoadScriptArtifact};
use crate::config::WarehouseConfig;
use crate::error::PipelineError;

const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Hive reserved keywords. Unquoted, these cannot name a table or column.
const RESERVED_WORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "ARRAY", "AS", "AUTHORIZATION", "BETWEEN", "BIGINT", "BINARY",
    "BOOLEAN", "BOTH", "BY", "CACHE", "CASE", "CAST", "CHAR", "COLUMN", "COMMIT", "CONF",
    "CONSTRAINT", "CREATE", "CROSS", "CUBE", "CURRENT", "CURRENT_DATE", "CURRENT_TIMESTAMP",
    "CURSOR", "DATABASE", "DATE", "DAYOFWEEK", "DECIMAL", "DELETE", "DESCRIBE", "DISTINCT",
    "DOUBLE", "DROP", "ELSE", "END", "EXCHANGE", "EXISTS", "EXTENDED", "EXTERNAL", "EXTRACT",
    "FALSE", "FETCH", "FLOAT", "FLOOR", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL",
    "FUNCTION", "GRANT", "GROUP", "GROUPING", "HAVING", "IF", "IMPORT", "IN", "INNER",
    "INSERT", "INT", "INTEGER", "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN", "LATERAL",
    "LEFT", "LESS", "LIKE", "LOCAL", "MACRO", "MAP", "MORE", "NONE", "NOT", "NULL", "NUMERIC",
    "OF", "ON", "ONLY", "OR", "ORDER", "OUT", "OUTER", "OVER", "PARTIALSCAN", "PARTITION",
    "PERCENT", "PRECEDING", "PRECISION", "PRESERVE", "PRIMARY", "PROCEDURE", "RANGE", "READS",
    "REDUCE", "REFERENCES", "REGEXP", "REVOKE", "RIGHT", "RLIKE", "ROLLBACK", "ROLLUP", "ROW",
    "ROWS", "SELECT", "SET", "SMALLINT", "START", "SYNC", "TABLE", "TABLESAMPLE", "THEN",
    "TIME", "TIMESTAMP", "TO", "TRANSFORM", "TRIGGER", "TRUE", "TRUNCATE", "UNBOUNDED",
    "UNION", "UNIQUEJOIN", "UPDATE", "USER", "USING", "UTC_TMESTAMP", "VALUES", "VARCHAR",
    "VIEWS", "WHEN", "WHERE", "WINDOW", "WITH",
];

fn identifier_regex() -> Result<&'static Regex, PipelineError> {
    static IDENTIFIER_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    IDENTIFIER_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$"))
        .as_ref()
        .map_err(|e| PipelineError::Config(format!("Failed to compile identifier regex: {}", e)))
}

/// A bare SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`) that is not a Hive
/// reserved word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, PipelineError> {
        if name.len() > MAX_IDENTIFIER_LENGTH || !identifier_regex()?.is_match(name) {
            return Err(PipelineError::InvalidIdentifier(name.to_string()));
        }
        if RESERVED_WORDS
            .iter()
            .any(|word| word.eq_ignore_ascii_case(name))
        {
            return Err(PipelineError::InvalidIdentifier(format!(
                "{} (reserved word)",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A table, optionally qualified by database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub database: Option<Identifier>,
    pub table: Identifier,
}

impl TableName {
    pub fn parse(database: Option<&str>, table: &str) -> Result<Self, PipelineError> {
        Ok(Self {
            database: database.map(Identifier::parse).transpose()?,
            table: Identifier::parse(table)?,
        })
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}", db, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// A single-quoted string literal.
///
/// Control characters and `;` are refused outright (the Hive CLI splits
/// statements on `;`); backslashes and quotes are escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(String);

impl Literal {
    pub fn new(value: &str) -> Result<Self, PipelineError> {
        if let Some(c) = value.chars().find(|c| c.is_control() || *c == ';') {
            return Err(PipelineError::InvalidLiteral(format!(
                "{:?} contains forbidden character {:?}",
                value, c
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for c in self.0.chars() {
            match c {
                '\\' => f.write_str("\\\\")?,
                '\'' => f.write_str("\\'")?,
                c => write!(f, "{}", c)?,
            }
        }
        f.write_str("'")
    }
}

/// One statement of the load procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateStaging {
        table: TableName,
    },
    CreateTarget {
        table: TableName,
        partition_column: Identifier,
    },
    TruncateStaging {
        table: TableName,
    },
    LoadStaging {
        path: Literal,
        table: TableName,
    },
    DropPartition {
        table: TableName,
        column: Identifier,
        date: Literal,
    },
    InsertPartition {
        target: TableName,
        staging: TableName,
        column: Identifier,
        date: Literal,
    },
    VerifyPartition {
        table: TableName,
        column: Identifier,
        date: Literal,
    },
}

impl Statement {
    pub fn description(&self) -> &'static str {
        match self {
            Self::CreateStaging { .. } => "Create staging table (TEXT format for CSV)",
            Self::CreateTarget { .. } => "Create final ORC table (partitioned)",
            Self::TruncateStaging { .. } => "Clear staging",
            Self::LoadStaging { .. } => "Load CSV into staging",
            Self::DropPartition { .. } => "Drop old partition",
            Self::InsertPartition { .. } => "Insert from staging to final table",
            Self::VerifyPartition { .. } => "Verify",
        }
    }

    /// Renders the statement without its trailing `;`.
    pub fn to_sql(&self) -> String {
        match self {
            Self::CreateStaging { table } => format!(
                "CREATE TABLE IF NOT EXISTS {} (\n    stock_symbol STRING,\n    price DECIMAL(10,2)\n)\n\
                 ROW FORMAT DELIMITED\nFIELDS TERMINATED BY ','\nSTORED AS TEXTFILE",
                table
            ),
            Self::CreateTarget {
                table,
                partition_column,
            } => format!(
                "CREATE TABLE IF NOT EXISTS {} (\n    stock_symbol STRING,\n    price DECIMAL(10,2)\n)\n\
                 PARTITIONED BY ({} STRING)\nSTORED AS ORC\nTBLPROPERTIES ('orc.compress'='SNAPPY')",
                table, partition_column
            ),
            Self::TruncateStaging { table } => format!("TRUNCATE TABLE {}", table),
            Self::LoadStaging { path, table } => {
                format!("LOAD DATA LOCAL INPATH {} INTO TABLE {}", path, table)
            }
            Self::DropPartition {
                table,
                column,
                date,
            } => format!(
                "ALTER TABLE {} DROP IF EXISTS PARTITION ({}={})",
                table, column, date
            ),
            Self::InsertPartition {
                target,
                staging,
                column,
                date,
            } => format!(
                "INSERT INTO TABLE {} PARTITION ({}={})\nSELECT stock_symbol, price FROM {}",
                target, column, date, staging
            ),
            Self::VerifyPartition {
                table,
                column,
                date,
            } => format!(
                "SELECT {col}, COUNT(*) AS record_count\nFROM {}\nWHERE {col}={}\nGROUP BY {col}",
                table,
                date,
                col = column
            ),
        }
    }
}

/// The ordered load procedure for one run date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadScript {
    pub run_date: NaiveDate,
    pub statements: Vec<Statement>,
}

impl LoadScript {
    pub fn render(&self) -> String {
        let mut out = format!(
            "-- EGX30 load for {}\n\n",
            self.run_date.format("%Y-%m-%d")
        );
        for (i, stmt) in self.statements.iter().enumerate() {
            out.push_str(&format!(
                "-- Step {}: {}\n{};\n\n",
                i + 1,
                stmt.description(),
                stmt.to_sql()
            ));
        }
        out
    }
}

impl fmt::Display for LoadScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Builder for [`LoadScript`]. Nothing is validated until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct LoadScriptBuilder {
    database: Option<String>,
    staging_table: String,
    target_table: String,
    partition_column: String,
    data_path: Option<PathBuf>,
    run_date: Option<NaiveDate>,
}

impl Default for LoadScriptBuilder {
    fn default() -> Self {
        Self::from_config(&WarehouseConfig::default())
    }
}

impl LoadScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(warehouse: &WarehouseConfig) -> Self {
        Self {
            database: warehouse.database.clone(),
            staging_table: warehouse.staging_table.clone(),
            target_table: warehouse.target_table.clone(),
            partition_column: warehouse.partition_column.clone(),
            data_path: None,
            run_date: None,
        }
    }

    pub fn database(mut self, database: Option<&str>) -> Self {
        self.database = database.map(str::to_string);
        self
    }

    pub fn staging_table(mut self, table: &str) -> Self {
        self.staging_table = table.to_string();
        self
    }

    pub fn target_table(mut self, table: &str) -> Self {
        self.target_table = table.to_string();
        self
    }

    pub fn partition_column(mut self, column: &str) -> Self {
        self.partition_column = column.to_string();
        self
    }

    /// Location of the clean dataset, as the warehouse engine will see it.
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn run_date(mut self, date: NaiveDate) -> Self {
        self.run_date = Some(date);
        self
    }

    pub fn build(self) -> Result<LoadScript, PipelineError> {
        let data_path = self
            .data_path
            .ok_or_else(|| PipelineError::Config("load script needs a data path".into()))?;
        let run_date = self
            .run_date
            .ok_or_else(|| PipelineError::Config("load script needs a run date".into()))?;

        let database = self.database.as_deref();
        let staging = TableName::parse(database, &self.staging_table)?;
        let target = TableName::parse(database, &self.target_table)?;
        let column = Identifier::parse(&self.partition_column)?;
        let path = Literal::new(data_path.to_str().ok_or_else(|| {
            PipelineError::InvalidLiteral(format!("{} is not valid UTF-8", data_path.display()))
        })?)?;
        let date = Literal::date(run_date);

        let statements = vec![
            Statement::CreateStaging {
                table: staging.clone(),
            },
            Statement::CreateTarget {
                table: target.clone(),
                partition_column: column.clone(),
            },
            Statement::TruncateStaging {
                table: staging.clone(),
            },
            Statement::LoadStaging {
                path,
                table: staging.clone(),
            },
            Statement::DropPartition {
                table: target.clone(),
                column: column.clone(),
                date: date.clone(),
            },
            Statement::InsertPartition {
                target: target.clone(),
                staging,
                column: column.clone(),
                date: date.clone(),
            },
            Statement::VerifyPartition {
                table: target,
                column,
                date,
            },
        ];

        Ok(LoadScript {
            run_date,
            statements,
        })
    }
}

/// Runs the generation stage for the clean dataset at `clean_path`.
///
/// The dataset path is made absolute so the script does not depend on the
/// engine's working directory; it must therefore exist.
pub fn generate(
    clean_path: &Path,
    warehouse: &WarehouseConfig,
    layout: &ArtifactLayout,
    run_date: NaiveDate,
) -> Result<LoadScriptArtifact, PipelineError> {
    let data_path = clean_path
        .canonicalize()
        .map_err(|e| PipelineError::io(clean_path, e))?;
    let script = LoadScriptBuilder::from_config(warehouse)
        .data_path(data_path)
        .run_date(run_date)
        .build()?;

    let path = layout.script_path(run_date);
    write_artifact(&path, script.render().as_bytes())?;
    tracing::info!("Created load script: {}", path.display());

    Ok(LoadScriptArtifact {
        path,
        run_date,
        statements: script.statements.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    type Row = (String, String);

    /// Minimal model of the warehouse semantics the script relies on:
    /// `LOAD DATA` and `INSERT INTO` append, `DROP PARTITION` removes.
    #[derive(Default)]
    struct Warehouse {
        staging: HashMap<String, Vec<Row>>,
        targets: HashMap<String, BTreeMap<String, Vec<Row>>>,
    }

    impl Warehouse {
        fn apply(&mut self, stmt: &Statement) -> Option<usize> {
            match stmt {
                Statement::CreateStaging { table } => {
                    self.staging.entry(table.to_string()).or_default();
                }
                Statement::CreateTarget { table, .. } => {
                    self.targets.entry(table.to_string()).or_default();
                }
                Statement::TruncateStaging { table } => {
                    self.staging.get_mut(&table.to_string()).unwrap().clear();
                }
                Statement::LoadStaging { path, table } => {
                    let content = std::fs::read_to_string(path.value()).unwrap();
                    let rows = content.lines().map(|line| {
                        let (symbol, price) = line.split_once(',').unwrap();
                        (symbol.to_string(), price.to_string())
                    });
                    self.staging
                        .get_mut(&table.to_string())
                        .unwrap()
                        .extend(rows);
                }
                Statement::DropPartition { table, date, .. } => {
                    self.targets
                        .get_mut(&table.to_string())
                        .unwrap()
                        .remove(date.value());
                }
                Statement::InsertPartition {
                    target,
                    staging,
                    date,
                    ..
                } => {
                    let rows = self.staging[&staging.to_string()].clone();
                    self.targets
                        .get_mut(&target.to_string())
                        .unwrap()
                        .entry(date.value().to_string())
                        .or_default()
                        .extend(rows);
                }
                Statement::VerifyPartition { table, date, .. } => {
                    return Some(
                        self.targets[&table.to_string()]
                            .get(date.value())
                            .map_or(0, Vec::len),
                    );
                }
            }
            None
        }

        fn run(&mut self, script: &LoadScript) -> Option<usize> {
            script.statements.iter().filter_map(|s| self.apply(s)).last()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 16).unwrap()
    }

    fn clean_file(dir: &Path) -> PathBuf {
        let path = dir.join("hive_data_2024-06-16.txt");
        std::fs::write(&path, "A,123.46\nB,10.00\nC,7.25\n").unwrap();
        path
    }

    #[test]
    fn identifier_validation() {
        assert!(Identifier::parse("egx30_stocks").is_ok());
        assert!(Identifier::parse("_tmp").is_ok());
        assert!(Identifier::parse("").is_err());
        assert!(Identifier::parse("1table").is_err());
        assert!(Identifier::parse("a.b").is_err());
        assert!(Identifier::parse("t; DROP TABLE x").is_err());
        assert!(Identifier::parse(&"a".repeat(129)).is_err());
    }

    #[test]
    fn reserved_words_rejected() {
        for word in ["date", "TABLE", "Partition", "select"] {
            assert!(
                matches!(Identifier::parse(word), Err(PipelineError::InvalidIdentifier(_))),
                "{} should be rejected",
                word
            );
        }
        assert!(Identifier::parse("trade_date").is_ok());
        assert!(Identifier::parse("dates").is_ok());

        let reserved_column = LoadScriptBuilder::new()
            .partition_column("date")
            .data_path("/tmp/x")
            .run_date(date())
            .build();
        assert!(matches!(reserved_column, Err(PipelineError::InvalidIdentifier(_))));
    }

    #[test]
    fn literal_escaping() {
        assert_eq!(Literal::new("/tmp/a.txt").unwrap().to_string(), "'/tmp/a.txt'");
        assert_eq!(
            Literal::new("/tmp/o'brien\\x").unwrap().to_string(),
            r"'/tmp/o\'brien\\x'"
        );
        assert!(Literal::new("/tmp/a\n.txt").is_err());
        assert!(Literal::new("/tmp/a';DROP TABLE t;--").is_err());
        assert_eq!(Literal::date(date()).to_string(), "'2024-06-16'");
    }

    #[test]
    fn statements_in_required_order() {
        let script = LoadScriptBuilder::new()
            .data_path("/tmp/hive_data_2024-06-16.txt")
            .run_date(date())
            .build()
            .unwrap();
        let kinds: Vec<&str> = script.statements.iter().map(|s| s.description()).collect();
        assert_eq!(
            kinds,
            vec![
                "Create staging table (TEXT format for CSV)",
                "Create final ORC table (partitioned)",
                "Clear staging",
                "Load CSV into staging",
                "Drop old partition",
                "Insert from staging to final table",
                "Verify",
            ]
        );
    }

    #[test]
    fn rendered_script_references_path_and_date() {
        let script = LoadScriptBuilder::new()
            .data_path("/tmp/hive_data_2024-06-16.txt")
            .run_date(date())
            .build()
            .unwrap();
        let text = script.render();
        assert!(text.contains(
            "LOAD DATA LOCAL INPATH '/tmp/hive_data_2024-06-16.txt' INTO TABLE egx30_staging;"
        ));
        assert!(text.contains(
            "ALTER TABLE egx30_stocks DROP IF EXISTS PARTITION (trade_date='2024-06-16');"
        ));
        assert!(text.contains("INSERT INTO TABLE egx30_stocks PARTITION (trade_date='2024-06-16')"));
        assert!(text.contains("WHERE trade_date='2024-06-16'"));
        assert!(text.contains("TBLPROPERTIES ('orc.compress'='SNAPPY')"));
        assert!(text.contains("-- Step 7: Verify"));
        let drop = text.find("DROP IF EXISTS PARTITION").unwrap();
        let insert = text.find("INSERT INTO TABLE").unwrap();
        assert!(drop < insert);
    }

    #[test]
    fn database_qualifies_tables() {
        let script = LoadScriptBuilder::new()
            .database(Some("markets"))
            .data_path("/tmp/x.txt")
            .run_date(date())
            .build()
            .unwrap();
        let text = script.render();
        assert!(text.contains("TRUNCATE TABLE markets.egx30_staging;"));
        assert!(text.contains("FROM markets.egx30_stocks"));
    }

    #[test]
    fn builder_rejects_bad_inputs() {
        let missing_path = LoadScriptBuilder::new().run_date(date()).build();
        assert!(matches!(missing_path, Err(PipelineError::Config(_))));

        let missing_date = LoadScriptBuilder::new().data_path("/tmp/x").build();
        assert!(matches!(missing_date, Err(PipelineError::Config(_))));

        let bad_table = LoadScriptBuilder::new()
            .target_table("stocks PARTITION")
            .data_path("/tmp/x")
            .run_date(date())
            .build();
        assert!(matches!(bad_table, Err(PipelineError::InvalidIdentifier(_))));

        let bad_path = LoadScriptBuilder::new()
            .data_path("/tmp/x';\nDROP TABLE egx30_stocks")
            .run_date(date())
            .build();
        assert!(matches!(bad_path, Err(PipelineError::InvalidLiteral(_))));
    }

    #[test]
    fn rerun_leaves_one_copy_of_partition() {
        let dir = tempfile::tempdir().unwrap();
        let script = LoadScriptBuilder::new()
            .data_path(clean_file(dir.path()))
            .run_date(date())
            .build()
            .unwrap();

        let mut once = Warehouse::default();
        let count_once = once.run(&script);

        let mut twice = Warehouse::default();
        twice.run(&script);
        let count_twice = twice.run(&script);

        assert_eq!(count_once, Some(3));
        assert_eq!(count_twice, count_once);
    }

    #[test]
    fn without_partition_drop_rows_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let mut script = LoadScriptBuilder::new()
            .data_path(clean_file(dir.path()))
            .run_date(date())
            .build()
            .unwrap();
        script
            .statements
            .retain(|s| !matches!(s, Statement::DropPartition { .. }));

        let mut warehouse = Warehouse::default();
        warehouse.run(&script);
        assert_eq!(warehouse.run(&script), Some(6));
    }

    #[test]
    fn other_dates_untouched_by_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let data = clean_file(dir.path());
        let first = LoadScriptBuilder::new()
            .data_path(&data)
            .run_date(date())
            .build()
            .unwrap();
        let second = LoadScriptBuilder::new()
            .data_path(&data)
            .run_date(date().succ_opt().unwrap())
            .build()
            .unwrap();

        let mut warehouse = Warehouse::default();
        warehouse.run(&first);
        warehouse.run(&second);
        warehouse.run(&first);
        assert_eq!(warehouse.targets["egx30_stocks"].len(), 2);
        assert!(warehouse.targets["egx30_stocks"].values().all(|rows| rows.len() == 3));
    }

    #[test]
    fn generate_writes_script_with_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let data = clean_file(dir.path());
        let layout = ArtifactLayout::new(dir.path());

        let artifact = generate(&data, &WarehouseConfig::default(), &layout, date()).unwrap();
        assert_eq!(artifact.path, layout.script_path(date()));
        assert_eq!(artifact.statements, 7);

        let text = std::fs::read_to_string(&artifact.path).unwrap();
        let absolute = data.canonicalize().unwrap();
        assert!(text.contains(&format!("'{}'", absolute.display())));
    }

    #[test]
    fn generate_requires_existing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        let result = generate(
            &dir.path().join("missing.txt"),
            &WarehouseConfig::default(),
            &layout,
            date(),
        );
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }
}
