use std::fmt;
use std::path::Path;

use resvg::usvg::fontdb;

use crate::chart::canvas::load_chart_fonts;
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Startup self-check
// ---------------------------------------------------------------------------

/// Problems found before the form opens. Startup continues regardless; the
/// report is logged so a broken install is visible before the first submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
    pub problems: Vec<String>,
}

impl PreflightReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

impl fmt::Display for PreflightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "✓ Verificação do ambiente concluída com sucesso");
        }
        write!(f, "Problemas encontrados na verificação do ambiente:")?;
        for problem in &self.problems {
            write!(f, "\n✗ {problem}")?;
        }
        Ok(())
    }
}

pub fn run(config: &AppConfig) -> PreflightReport {
    let mut problems = Vec::new();

    let mut db = fontdb::Database::new();
    match load_chart_fonts(&mut db) {
        Ok(family) => log::debug!("Chart font family: {family}"),
        Err(e) => problems.push(format!("Fontes do gráfico indisponíveis: {e}")),
    }

    if let Err(problem) = check_writable_dir(&config.chart_dir) {
        problems.push(problem);
    }

    if let Some(parent) = config.spreadsheet.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(problem) = check_writable_dir(parent) {
            problems.push(problem);
        }
    }
    if config.spreadsheet.is_dir() {
        problems.push(format!("Planilha aponta para um diretório: {}", config.spreadsheet.display()));
    }

    let chart = &config.chart;
    if ![chart.width, chart.height, chart.scale].iter().all(|v| v.is_finite() && *v > 0.0) {
        problems.push(format!(
            "Dimensões do gráfico inválidas: {}x{} escala {}",
            chart.width, chart.height, chart.scale
        ));
    }
    if chart.axis_margin.is_nan() || chart.axis_margin < 0.0 {
        problems.push(format!("Margem do eixo inválida: {}", chart.axis_margin));
    }

    PreflightReport { problems }
}

/// Create `dir` if needed and prove a file can be written in it.
fn check_writable_dir(dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Não foi possível criar {}: {e}", dir.display()))?;
    tempfile::tempfile_in(dir)
        .map(drop)
        .map_err(|e| format!("Sem permissão de escrita em {}: {e}", dir.display()))
}
