//! Discoveries, impacts and documents as mirrored from the detection service.
//!
//! The service speaks Spanish field names (`proyecto_id`,
//! `max_nivel_relevancia`, ...). They are mapped onto English field names here
//! so the wire format stays at the boundary. Every type is validated while it
//! is deserialised: unknown states and out-of-range relevances are rejected
//! rather than carried inward.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  lifecycle::DiscoveryState,
  tier::{ImpactTier, Relevance},
  timeline::{Timeline, derive_timeline},
  timestamp,
};

// ─── Bill metadata ───────────────────────────────────────────────────────────

/// Legislative metadata about the bill behind a discovery. Only the tracking
/// listing carries it; every field may still be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillInfo {
  /// Legislative stage, nominally `1..=4`.
  pub stage:         Option<i32>,
  /// Date the bill was introduced; the timeline's reference date.
  pub introduced_on: Option<NaiveDate>,
  /// Chamber of origin (e.g. "Senado").
  pub chamber:       Option<String>,
}

impl BillInfo {
  /// Assemble from the three nullable wire fields. Returns `None` when none
  /// of them carries a value.
  pub fn from_parts(
    stage: Option<i32>,
    date: Option<&str>,
    chamber: Option<String>,
  ) -> Option<Self> {
    let info = Self {
      stage,
      introduced_on: date.and_then(timestamp::parse_date),
      chamber: chamber.filter(|c| !c.trim().is_empty()),
    };
    (info != Self::default()).then_some(info)
  }
}

// ─── DiscoverySummary ────────────────────────────────────────────────────────

/// One row of the pending or tracking discovery listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDiscoverySummary", into = "RawDiscoverySummary")]
pub struct DiscoverySummary {
  pub id:             i64,
  pub bill_id:        String,
  pub bill_title:     String,
  pub impact_summary: Option<String>,
  pub analyzed_at:    DateTime<Utc>,
  pub impact_count:   u32,
  pub max_relevance:  Relevance,
  pub document_id:    i64,
  pub document_name:  String,
  pub state:          DiscoveryState,
  pub bill:           Option<BillInfo>,
}

impl DiscoverySummary {
  pub fn tier(&self) -> ImpactTier { self.max_relevance.tier() }

  /// The legislative timeline of the bill, recomputed on every call.
  pub fn timeline(&self) -> Timeline {
    let bill = self.bill.as_ref();
    derive_timeline(
      bill.and_then(|b| b.stage),
      bill.and_then(|b| b.introduced_on),
    )
  }
}

#[derive(Serialize, Deserialize)]
struct RawDiscoverySummary {
  id:                              i64,
  proyecto_id:                     String,
  proyecto_titulo:                 String,
  #[serde(default)]
  descripcion_impacto_consolidada: Option<String>,
  #[serde(with = "timestamp::utc")]
  fecha_analisis:                  DateTime<Utc>,
  cantidad_impactos:               u32,
  max_nivel_relevancia:            Relevance,
  documento_nombre:                String,
  documento_id:                    i64,
  estado:                          DiscoveryState,
  #[serde(default)]
  proyecto_etapa:                  Option<i32>,
  #[serde(default)]
  proyecto_fecha:                  Option<String>,
  #[serde(default)]
  proyecto_camara_origen:          Option<String>,
}

impl From<RawDiscoverySummary> for DiscoverySummary {
  fn from(raw: RawDiscoverySummary) -> Self {
    Self {
      bill: BillInfo::from_parts(
        raw.proyecto_etapa,
        raw.proyecto_fecha.as_deref(),
        raw.proyecto_camara_origen,
      ),
      id:             raw.id,
      bill_id:        raw.proyecto_id,
      bill_title:     raw.proyecto_titulo,
      impact_summary: raw.descripcion_impacto_consolidada,
      analyzed_at:    raw.fecha_analisis,
      impact_count:   raw.cantidad_impactos,
      max_relevance:  raw.max_nivel_relevancia,
      document_id:    raw.documento_id,
      document_name:  raw.documento_nombre,
      state:          raw.estado,
    }
  }
}

impl From<DiscoverySummary> for RawDiscoverySummary {
  fn from(s: DiscoverySummary) -> Self {
    let bill = s.bill.unwrap_or_default();
    Self {
      id:                              s.id,
      proyecto_id:                     s.bill_id,
      proyecto_titulo:                 s.bill_title,
      descripcion_impacto_consolidada: s.impact_summary,
      fecha_analisis:                  s.analyzed_at,
      cantidad_impactos:               s.impact_count,
      max_nivel_relevancia:            s.max_relevance,
      documento_nombre:                s.document_name,
      documento_id:                    s.document_id,
      estado:                          s.state,
      proyecto_etapa:                  bill.stage,
      proyecto_fecha:                  bill
        .introduced_on
        .map(|d| d.format("%Y-%m-%d").to_string()),
      proyecto_camara_origen:          bill.chamber,
    }
  }
}

// ─── Impact ──────────────────────────────────────────────────────────────────

/// A single excerpt-level overlap between a document and a bill article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
  pub id:               i64,
  #[serde(rename = "articulo_numero")]
  pub article_number:   i64,
  #[serde(rename = "extracto_interno")]
  pub document_excerpt: String,
  #[serde(rename = "extracto_articulo")]
  pub bill_excerpt:     String,
  #[serde(rename = "nivel_relevancia")]
  pub relevance:        Relevance,
  #[serde(rename = "descripcion_impacto")]
  pub description:      String,
  #[serde(with = "timestamp::utc")]
  pub created_at:       DateTime<Utc>,
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// An uploaded corporate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
  pub id:              i64,
  #[serde(rename = "nombre")]
  pub name:            String,
  #[serde(rename = "fecha_carga", with = "timestamp::utc")]
  pub uploaded_at:     DateTime<Utc>,
  #[serde(rename = "cantidad_descubrimientos")]
  pub discovery_count: u32,
}

/// A discovery as nested in a [`DocumentDetail`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDiscovery {
  pub id:             i64,
  #[serde(rename = "proyecto_id")]
  pub bill_id:        String,
  #[serde(rename = "proyecto_titulo")]
  pub bill_title:     String,
  #[serde(rename = "descripcion_impacto_consolidada", default)]
  pub impact_summary: Option<String>,
  #[serde(rename = "fecha_analisis", with = "timestamp::utc")]
  pub analyzed_at:    DateTime<Utc>,
  #[serde(rename = "impactos", default)]
  pub impacts:        Vec<Impact>,
}

/// `GET /documents/{id}`: a document with all of its discoveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetail {
  pub id:          i64,
  #[serde(rename = "nombre")]
  pub name:        String,
  #[serde(rename = "fecha_carga", with = "timestamp::utc")]
  pub uploaded_at: DateTime<Utc>,
  #[serde(rename = "descubrimientos", default)]
  pub discoveries: Vec<DocumentDiscovery>,
}

// ─── DiscoveryDetail ─────────────────────────────────────────────────────────

/// `GET /discoveries/{id}`: a discovery with its impacts and owning document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDetail {
  pub id:             i64,
  #[serde(rename = "proyecto_id")]
  pub bill_id:        String,
  #[serde(rename = "proyecto_titulo")]
  pub bill_title:     String,
  #[serde(rename = "descripcion_impacto_consolidada", default)]
  pub impact_summary: Option<String>,
  #[serde(rename = "fecha_analisis", with = "timestamp::utc")]
  pub analyzed_at:    DateTime<Utc>,
  #[serde(rename = "estado")]
  pub state:          DiscoveryState,
  #[serde(rename = "max_nivel_relevancia")]
  pub max_relevance:  Relevance,
  #[serde(rename = "documento")]
  pub document:       DocumentSummary,
  /// Server order is preserved.
  #[serde(rename = "impactos", default)]
  pub impacts:        Vec<Impact>,
}

impl DiscoveryDetail {
  pub fn tier(&self) -> ImpactTier { self.max_relevance.tier() }

  pub fn impact_count(&self) -> u32 {
    u32::try_from(self.impacts.len()).unwrap_or(u32::MAX)
  }
}

// ─── Detection ───────────────────────────────────────────────────────────────

/// A discovery created by a detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedDiscovery {
  pub id:             i64,
  #[serde(rename = "proyecto_id")]
  pub bill_id:        String,
  #[serde(rename = "proyecto_titulo")]
  pub bill_title:     String,
  #[serde(rename = "descripcion_impacto_consolidada", default)]
  pub impact_summary: Option<String>,
  #[serde(rename = "cantidad_impactos")]
  pub impact_count:   u32,
}

/// `POST /detect`: the outcome of uploading a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
  #[serde(rename = "documento_id")]
  pub document_id:   i64,
  #[serde(rename = "documento_nombre")]
  pub document_name: String,
  #[serde(rename = "fecha_carga", with = "timestamp::utc")]
  pub uploaded_at:   DateTime<Utc>,
  #[serde(rename = "descubrimientos", default)]
  pub discoveries:   Vec<DetectedDiscovery>,
  #[serde(rename = "pending_discoveries_count")]
  pub pending_count: usize,
}

// ─── Acknowledgements ────────────────────────────────────────────────────────

/// Response to `POST /discoveries/{id}/track` and `/discard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
  pub success: bool,
  pub message: String,
  #[serde(rename = "estado")]
  pub state:   DiscoveryState,
}

/// Response to `DELETE /documents/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
  pub success: bool,
  pub message: String,
}

/// Response to the demo hook `POST /demo/advance-time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAdvance {
  pub success:       bool,
  pub message:       String,
  #[serde(rename = "proyectos_actualizados")]
  pub bills_advanced: u32,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::timeline::MilestoneStatus;

  fn tracking_row() -> serde_json::Value {
    json!({
      "id": 7,
      "proyecto_id": "12058-08",
      "proyecto_titulo": "Ley de Protección de Datos Personales",
      "descripcion_impacto_consolidada": null,
      "fecha_analisis": "2024-03-01T10:00:00Z",
      "cantidad_impactos": 3,
      "max_nivel_relevancia": 87,
      "documento_nombre": "politica.pdf",
      "documento_id": 2,
      "estado": "TRACKING",
      "proyecto_etapa": 3,
      "proyecto_fecha": "2024-01-10",
      "proyecto_camara_origen": "Senado"
    })
  }

  #[test]
  fn summary_maps_wire_fields() {
    let s: DiscoverySummary = serde_json::from_value(tracking_row()).unwrap();
    assert_eq!(s.bill_id, "12058-08");
    assert_eq!(s.state, DiscoveryState::Tracking);
    assert_eq!(s.tier(), ImpactTier::Alto);
    let bill = s.bill.as_ref().unwrap();
    assert_eq!(bill.stage, Some(3));
    assert_eq!(bill.chamber.as_deref(), Some("Senado"));
    assert_eq!(
      bill.introduced_on,
      NaiveDate::from_ymd_opt(2024, 1, 10)
    );
  }

  #[test]
  fn pending_row_without_bill_fields_has_no_bill() {
    let mut row = tracking_row();
    let obj = row.as_object_mut().unwrap();
    obj.remove("proyecto_etapa");
    obj.remove("proyecto_fecha");
    obj.insert("proyecto_camara_origen".into(), json!(""));
    obj.insert("estado".into(), json!("PENDING"));

    let s: DiscoverySummary = serde_json::from_value(row).unwrap();
    assert!(s.bill.is_none());
    let timeline = s.timeline();
    assert_eq!(timeline.milestones[0].status, MilestoneStatus::InProgress);
    assert!(timeline.milestones.iter().all(|m| m.date.is_none()));
  }

  #[test]
  fn summary_rejects_unknown_state_and_bad_relevance() {
    let mut row = tracking_row();
    row["estado"] = json!("ARCHIVED");
    assert!(serde_json::from_value::<DiscoverySummary>(row).is_err());

    let mut row = tracking_row();
    row["max_nivel_relevancia"] = json!(250);
    assert!(serde_json::from_value::<DiscoverySummary>(row).is_err());
  }

  #[test]
  fn summary_serialises_back_to_wire_names() {
    let s: DiscoverySummary = serde_json::from_value(tracking_row()).unwrap();
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["proyecto_fecha"], "2024-01-10");
    assert_eq!(v["estado"], "TRACKING");
    assert_eq!(v["max_nivel_relevancia"], 87);
  }

  #[test]
  fn detail_preserves_impact_order() {
    let v = json!({
      "id": 7,
      "proyecto_id": "12058-08",
      "proyecto_titulo": "Datos",
      "descripcion_impacto_consolidada": "Resumen",
      "fecha_analisis": "2024-03-01T10:00:00",
      "estado": "PENDING",
      "max_nivel_relevancia": 60,
      "documento": {
        "id": 2,
        "nombre": "politica.pdf",
        "fecha_carga": "2024-02-28T09:00:00Z",
        "cantidad_descubrimientos": 4
      },
      "impactos": [
        {
          "id": 11, "articulo_numero": 15,
          "extracto_interno": "a", "extracto_articulo": "b",
          "nivel_relevancia": 20, "descripcion_impacto": "menor",
          "created_at": "2024-03-01T10:00:00Z"
        },
        {
          "id": 10, "articulo_numero": 7,
          "extracto_interno": "c", "extracto_articulo": "d",
          "nivel_relevancia": 60, "descripcion_impacto": "mayor",
          "created_at": "2024-03-01T10:00:00Z"
        }
      ]
    });
    let d: DiscoveryDetail = serde_json::from_value(v).unwrap();
    assert_eq!(d.impact_count(), 2);
    assert_eq!(d.impacts[0].id, 11);
    assert_eq!(d.impacts[1].article_number, 7);
    assert_eq!(d.impacts[0].relevance.tier(), ImpactTier::Bajo);
    assert_eq!(d.document.discovery_count, 4);
  }
}
