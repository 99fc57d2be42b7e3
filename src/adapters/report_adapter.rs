//! Training report writer: confusion matrix, per-class report, and the
//! next-day-return backtest summary, each as a CSV in the report dir.

use std::fs;
use std::path::PathBuf;

use crate::domain::encoder::LabelEncoder;
use crate::domain::error::CoincastError;
use crate::domain::train::Diagnostics;

pub const CONFUSION_FILE: &str = "confusion_matrix.csv";
pub const REPORT_FILE: &str = "classification_report.csv";
pub const BACKTEST_FILE: &str = "backtest_summary.csv";

pub struct ReportAdapter {
    dir: PathBuf,
}

impl ReportAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(
        &self,
        diagnostics: &Diagnostics,
        encoder: &LabelEncoder,
    ) -> Result<(), CoincastError> {
        fs::create_dir_all(&self.dir)?;
        self.write_confusion(diagnostics, encoder)?;
        self.write_report(diagnostics, encoder)?;
        self.write_backtest(diagnostics)?;
        Ok(())
    }

    fn writer(&self, file: &str) -> Result<csv::Writer<fs::File>, CoincastError> {
        let path = self.dir.join(file);
        csv::Writer::from_path(&path).map_err(|e| CoincastError::Io(std::io::Error::other(
            format!("failed to open {}: {e}", path.display()),
        )))
    }

    fn write_confusion(
        &self,
        diagnostics: &Diagnostics,
        encoder: &LabelEncoder,
    ) -> Result<(), CoincastError> {
        let mut writer = self.writer(CONFUSION_FILE)?;
        let classes: Vec<String> = encoder.classes().iter().map(|c| c.to_string()).collect();

        let mut header = vec!["actual".to_string()];
        header.extend(classes.iter().map(|c| format!("predicted_{c}")));
        write_row(&mut writer, &header)?;

        for (truth, row) in diagnostics.confusion.iter().enumerate() {
            let mut record = vec![classes[truth].clone()];
            record.extend(row.iter().map(|n| n.to_string()));
            write_row(&mut writer, &record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_report(
        &self,
        diagnostics: &Diagnostics,
        encoder: &LabelEncoder,
    ) -> Result<(), CoincastError> {
        let mut writer = self.writer(REPORT_FILE)?;
        write_row(
            &mut writer,
            &["class", "precision", "recall", "f1", "support"],
        )?;
        for entry in &diagnostics.report {
            let class = encoder
                .decode(entry.class)
                .map(|s| s.to_string())
                .unwrap_or_else(|| entry.class.to_string());
            write_row(
                &mut writer,
                &[
                    class,
                    format!("{:.4}", entry.precision),
                    format!("{:.4}", entry.recall),
                    format!("{:.4}", entry.f1),
                    entry.support.to_string(),
                ],
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_backtest(&self, diagnostics: &Diagnostics) -> Result<(), CoincastError> {
        let mut writer = self.writer(BACKTEST_FILE)?;
        write_row(
            &mut writer,
            &["signal", "mean_next_day_return", "n_predictions"],
        )?;
        for row in &diagnostics.backtest {
            write_row(
                &mut writer,
                &[
                    row.signal.to_string(),
                    format!("{:.6}", row.mean_next_day_return),
                    row.n_predictions.to_string(),
                ],
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn write_row<W: std::io::Write, S: AsRef<[u8]>>(
    writer: &mut csv::Writer<W>,
    record: &[S],
) -> Result<(), CoincastError> {
    writer
        .write_record(record.iter().map(|s| s.as_ref()))
        .map_err(|e| CoincastError::Io(std::io::Error::other(format!("CSV write error: {e}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::label::Signal;
    use crate::domain::metrics::ClassReport;
    use crate::domain::train::BacktestRow;
    use tempfile::TempDir;

    fn diagnostics() -> Diagnostics {
        Diagnostics {
            confusion: vec![vec![5, 1, 0], vec![2, 7, 1], vec![0, 1, 3]],
            report: (0..3)
                .map(|class| ClassReport {
                    class,
                    precision: 0.8,
                    recall: 0.75,
                    f1: 0.7742,
                    support: 6 + class,
                })
                .collect(),
            backtest: vec![
                BacktestRow {
                    signal: Signal::Buy,
                    mean_next_day_return: 0.012,
                    n_predictions: 7,
                },
                BacktestRow {
                    signal: Signal::Hold,
                    mean_next_day_return: 0.001,
                    n_predictions: 9,
                },
                BacktestRow {
                    signal: Signal::Sell,
                    mean_next_day_return: -0.008,
                    n_predictions: 4,
                },
            ],
        }
    }

    #[test]
    fn writes_all_three_reports() {
        let dir = TempDir::new().unwrap();
        let adapter = ReportAdapter::new(dir.path().to_path_buf());
        adapter.write(&diagnostics(), &LabelEncoder::fit(&[])).unwrap();

        for file in [CONFUSION_FILE, REPORT_FILE, BACKTEST_FILE] {
            assert!(dir.path().join(file).exists(), "missing {file}");
        }
    }

    #[test]
    fn confusion_rows_are_labeled_by_class() {
        let dir = TempDir::new().unwrap();
        let adapter = ReportAdapter::new(dir.path().to_path_buf());
        adapter.write(&diagnostics(), &LabelEncoder::fit(&[])).unwrap();

        let content = fs::read_to_string(dir.path().join(CONFUSION_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "actual,predicted_Buy,predicted_Hold,predicted_Sell"
        );
        assert_eq!(lines[1], "Buy,5,1,0");
        assert_eq!(lines[3], "Sell,0,1,3");
    }

    #[test]
    fn backtest_summary_keeps_signal_order() {
        let dir = TempDir::new().unwrap();
        let adapter = ReportAdapter::new(dir.path().to_path_buf());
        adapter.write(&diagnostics(), &LabelEncoder::fit(&[])).unwrap();

        let content = fs::read_to_string(dir.path().join(BACKTEST_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[1].starts_with("Buy,0.012"));
        assert!(lines[2].starts_with("Hold,0.001"));
        assert!(lines[3].starts_with("Sell,-0.008"));
    }
}
