use serde::{Deserialize, Serialize};

use crate::error::{AppError, CONFIG_DECODE_FAILED};

/// Dashboard constants owned by the metrics engine.
///
/// Defaults reproduce the production dashboard. Any field missing from a JSON document
/// keeps its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Colors assigned to `techData` entries by post-sort rank, cycling.
    pub palette: Vec<String>,
    /// Constant status list handed to the filter UI.
    pub statuses: Vec<String>,
    pub tech_top_n: usize,
    pub recent_limit: usize,
    pub city_top_n: usize,
    pub matrix_columns: usize,
    pub outage_threshold: usize,
    pub signal_loss_pattern: String,
    pub degradation_pattern: String,
    /// Case-insensitive marker in `nature` flagging a critical incident.
    pub critical_marker: String,
    /// Failure key used when both cause and category are missing.
    pub fallback_cause: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            palette: ["#e0062e", "#a855f7", "#3b82f6", "#10b981", "#f59e0b"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            statuses: ["Todos", "Pendentes", "Tratadas"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tech_top_n: 5,
            recent_limit: 4,
            city_top_n: 10,
            matrix_columns: 5,
            outage_threshold: 3,
            signal_loss_pattern: "SEM SINAL".to_string(),
            degradation_pattern: "DEGRADAÇÃO".to_string(),
            critical_marker: "prejuizo".to_string(),
            fallback_cause: "Outros".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text).map_err(|e| {
            AppError::new(CONFIG_DECODE_FAILED, "Failed to decode engine config JSON")
                .with_details(e.to_string())
        })
    }

    pub(crate) fn color_for_rank(&self, rank: usize) -> String {
        if self.palette.is_empty() {
            return String::new();
        }
        self.palette[rank % self.palette.len()].clone()
    }
}

/// Ordered key variants per canonical incident field, evaluated first-match-wins.
///
/// Source schemas disagree on spelling and casing (`idEvento`, `id_evento`, `ID_EVENTO`...).
/// Keeping the variants as data lets a new schema be supported by configuration alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldRules {
    pub timestamp: Vec<String>,
    /// Separate time-of-day column, combined with a date-only `timestamp` value.
    pub time_of_day: Vec<String>,
    pub id: Vec<String>,
    pub category: Vec<String>,
    pub market: Vec<String>,
    pub nature: Vec<String>,
    pub cause: Vec<String>,
    pub city: Vec<String>,
    pub group: Vec<String>,
    pub equipment: Vec<String>,
    pub resolved_at: Vec<String>,
    pub associates: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            timestamp: keys(&[
                "data",
                "Data",
                "DATA",
                "dataEvento",
                "data_evento",
                "dt_abertura",
                "dataAbertura",
                "created_at",
                "timestamp",
            ]),
            time_of_day: keys(&["hora", "Hora", "HORA", "hr_abertura"]),
            id: keys(&["idEvento", "id_evento", "IdEvento", "ID_EVENTO", "id", "ID"]),
            category: keys(&["tipoEvento", "tipo_evento", "TipoEvento", "TIPO_EVENTO", "tipo"]),
            market: keys(&["mercado", "Mercado", "MERCADO", "nm_mercado"]),
            nature: keys(&["natureza", "Natureza", "NATUREZA", "nm_natureza"]),
            cause: keys(&["sintoma", "Sintoma", "SINTOMA", "nm_sintoma"]),
            city: keys(&["cidade", "Cidade", "CIDADE", "nm_cidade"]),
            group: keys(&["grupo", "Grupo", "GRUPO", "nm_grupo", "cluster"]),
            equipment: keys(&["equipamento", "Equipamento", "EQUIPAMENTO", "nm_equipamento"]),
            resolved_at: keys(&["dataPrev", "data_prev", "DataPrev", "DATA_PREV", "dt_previsao"]),
            associates: keys(&["associados", "Associados", "ASSOCIADOS"]),
        }
    }
}

impl FieldRules {
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text).map_err(|e| {
            AppError::new(CONFIG_DECODE_FAILED, "Failed to decode field rules JSON")
                .with_details(e.to_string())
        })
    }
}

/// Key variants and fallbacks for one secondary monitor feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorRules {
    pub id: Vec<String>,
    pub title: Vec<String>,
    pub location: Vec<String>,
    pub status: Vec<String>,
    pub time: Vec<String>,
    pub default_title: String,
    pub default_location: String,
    pub default_status: String,
}

impl MonitorRules {
    pub fn new_monitor() -> Self {
        Self {
            id: keys(&["id"]),
            title: keys(&["evento", "descricao"]),
            location: keys(&["cidade", "uf"]),
            status: keys(&["status"]),
            time: keys(&["data"]),
            default_title: "Alerta NewMonitor".to_string(),
            default_location: "Brasil".to_string(),
            default_status: "Pendente".to_string(),
        }
    }

    pub fn sgo() -> Self {
        Self {
            id: keys(&["protocolo"]),
            title: keys(&["incidente"]),
            location: keys(&["localidade"]),
            status: keys(&["estado"]),
            time: keys(&["hora"]),
            default_title: "Incidente SGO".to_string(),
            default_location: "N/A".to_string(),
            default_status: "Aberto".to_string(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text).map_err(|e| {
            AppError::new(CONFIG_DECODE_FAILED, "Failed to decode monitor rules JSON")
                .with_details(e.to_string())
        })
    }
}
