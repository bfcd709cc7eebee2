//! Minuta records: the persisted snapshot of a priced wizard plus its review workflow.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::PricingEngine;
use crate::error::PricingError;
use crate::wizard::{WizardData, WizardStep, validate_step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Comercial,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Comercial => f.write_str("comercial"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// Draft minutas are saved by the sales rep as they go; definitive ones are
/// the formal agreement reviewed by administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinutaKind {
    Provisoria,
    Definitiva,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinutaStatus {
    Pendiente,
    Revisada,
    Aprobada,
    Rechazada,
    Firmada,
    Cancelada,
}

impl MinutaStatus {
    /// States reachable in one move. There is no way back to an earlier state.
    pub fn successors(&self) -> &'static [MinutaStatus] {
        use MinutaStatus::*;
        match self {
            Pendiente => &[Revisada, Aprobada, Rechazada, Cancelada],
            Revisada => &[Aprobada, Rechazada, Cancelada],
            Aprobada => &[Firmada, Cancelada],
            Firmada => &[Cancelada],
            Rechazada | Cancelada => &[],
        }
    }

    pub fn can_transition_to(&self, next: MinutaStatus) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MinutaStatus::Pendiente => "pendiente",
            MinutaStatus::Revisada => "revisada",
            MinutaStatus::Aprobada => "aprobada",
            MinutaStatus::Rechazada => "rechazada",
            MinutaStatus::Firmada => "firmada",
            MinutaStatus::Cancelada => "cancelada",
        }
    }
}

impl fmt::Display for MinutaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minuta {
    pub id: Uuid,
    #[serde(rename = "tipo")]
    pub kind: MinutaKind,
    #[serde(rename = "proyecto")]
    pub project: String,
    #[serde(rename = "usuario_id")]
    pub user_id: String,
    #[serde(rename = "datos")]
    pub data: WizardData,
    #[serde(rename = "estado")]
    pub status: MinutaStatus,
    #[serde(rename = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
    /// Sales map record of the units as they were when the minuta was saved.
    #[serde(rename = "mapa_ventas", default, skip_serializing_if = "Option::is_none")]
    pub sales_map: Option<serde_json::Value>,
}

/// Wire payload handed to the persistence service.
#[derive(Serialize)]
struct MinutaPayload<'a> {
    proyecto: &'a str,
    usuario_id: &'a str,
    estado: MinutaStatus,
    datos: &'a WizardData,
}

impl Minuta {
    /// Creates a minuta from the wizard data, recomputing every derived total first.
    ///
    /// Only the comercial role creates minutas. A definitive minuta must pass
    /// the full wizard validation, a draft only needs consistent inputs.
    pub fn create(
        kind: MinutaKind,
        user_id: impl Into<String>,
        role: Role,
        mut data: WizardData,
        engine: &PricingEngine,
    ) -> Result<Self, PricingError> {
        if role != Role::Comercial {
            return Err(PricingError::Forbidden {
                role,
                action: "create minutas",
            });
        }
        if data.project.trim().is_empty() {
            return Err(PricingError::MissingSelection("proyecto"));
        }

        engine.recompute(&mut data)?;
        if kind == MinutaKind::Definitiva {
            validate_step(WizardStep::Summary, &data, engine)?;
        }

        let minuta = Self {
            id: Uuid::new_v4(),
            kind,
            project: data.project.clone(),
            user_id: user_id.into(),
            data,
            status: MinutaStatus::Pendiente,
            created_at: Utc::now(),
            sales_map: None,
        };
        tracing::info!(id = %minuta.id, kind = ?minuta.kind, project = %minuta.project, "minuta created");
        Ok(minuta)
    }

    pub fn with_sales_map(mut self, snapshot: serde_json::Value) -> Self {
        self.sales_map = Some(snapshot);
        self
    }

    /// Moves the minuta along its workflow. Only administrators review minutas.
    pub fn transition(&mut self, role: Role, next: MinutaStatus) -> Result<(), PricingError> {
        if role != Role::Admin {
            return Err(PricingError::Forbidden {
                role,
                action: "change the minuta status",
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(PricingError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        tracing::info!(id = %self.id, from = %self.status, to = %next, "minuta status changed");
        self.status = next;
        Ok(())
    }

    /// Replaces the stored wizard data, recomputing its totals. Closed minutas
    /// cannot be edited.
    pub fn update_data(
        &mut self,
        role: Role,
        mut data: WizardData,
        engine: &PricingEngine,
    ) -> Result<(), PricingError> {
        if role != Role::Admin {
            return Err(PricingError::Forbidden {
                role,
                action: "edit minuta data",
            });
        }
        if self.status.is_terminal() {
            return Err(PricingError::ClosedMinuta(self.status));
        }

        engine.recompute(&mut data)?;
        self.project = data.project.clone();
        self.data = data;
        tracing::info!(id = %self.id, "minuta data updated");
        Ok(())
    }

    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(MinutaPayload {
            proyecto: &self.project,
            usuario_id: &self.user_id,
            estado: self.status,
            datos: &self.data,
        })
    }
}

/// Persistence boundary for minutas. Last write wins.
pub trait MinutaStore {
    fn save(&self, minuta: &Minuta) -> Result<(), PricingError>;
    fn get(&self, id: Uuid) -> Result<Minuta, PricingError>;
    /// Replaces the wizard data of a stored minuta through [`Minuta::update_data`]
    /// and returns the updated record.
    fn update_data(
        &self,
        id: Uuid,
        role: Role,
        data: WizardData,
        engine: &PricingEngine,
    ) -> Result<Minuta, PricingError>;
    fn list_by_status(&self, status: MinutaStatus) -> Result<Vec<Minuta>, PricingError>;
}

#[derive(Debug, Default)]
pub struct InMemoryMinutaStore {
    minutas: RwLock<HashMap<Uuid, Minuta>>,
}

impl InMemoryMinutaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MinutaStore for InMemoryMinutaStore {
    fn save(&self, minuta: &Minuta) -> Result<(), PricingError> {
        let mut minutas = self
            .minutas
            .write()
            .map_err(|err| PricingError::Storage(err.to_string()))?;
        minutas.insert(minuta.id, minuta.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Minuta, PricingError> {
        let minutas = self
            .minutas
            .read()
            .map_err(|err| PricingError::Storage(err.to_string()))?;
        minutas
            .get(&id)
            .cloned()
            .ok_or_else(|| PricingError::NotFound(id.to_string()))
    }

    fn update_data(
        &self,
        id: Uuid,
        role: Role,
        data: WizardData,
        engine: &PricingEngine,
    ) -> Result<Minuta, PricingError> {
        let mut minutas = self
            .minutas
            .write()
            .map_err(|err| PricingError::Storage(err.to_string()))?;
        let stored = minutas
            .get_mut(&id)
            .ok_or_else(|| PricingError::NotFound(id.to_string()))?;

        // edit a copy so a rejected update leaves the stored record as it was
        let mut updated = stored.clone();
        updated.update_data(role, data, engine)?;
        *stored = updated.clone();
        Ok(updated)
    }

    fn list_by_status(&self, status: MinutaStatus) -> Result<Vec<Minuta>, PricingError> {
        let minutas = self
            .minutas
            .read()
            .map_err(|err| PricingError::Storage(err.to_string()))?;
        let mut found: Vec<Minuta> = minutas
            .values()
            .filter(|minuta| minuta.status == status)
            .cloned()
            .collect();
        found.sort_by_key(|minuta| minuta.created_at);
        Ok(found)
    }
}
