use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::ServiceType;
use crate::TechnicianId;

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechnicianStatus
{
    #[default]
    Active,
    Inactive,
    OnVacation,
    Terminated,
}

/// A technician and the set of service types they are qualified for.
///
/// Workload is not stored here. It is derived from the appointment store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technician
{
    technician_id: TechnicianId,
    name: String,
    status: TechnicianStatus,
    skills: BTreeSet<ServiceType>,
}

pub struct TechnicianBuilder
{
    technician_id: TechnicianId,
    name: String,
    status: TechnicianStatus,
    skills: BTreeSet<ServiceType>,
}

impl TechnicianBuilder
{
    pub fn new(technician_id: TechnicianId) -> Self
    {
        Self {
            technician_id,
            name: format!("technician-{technician_id}"),
            status: TechnicianStatus::Active,
            skills: BTreeSet::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self
    {
        self.name = name.into();
        self
    }

    pub fn status(mut self, status: TechnicianStatus) -> Self
    {
        self.status = status;
        self
    }

    pub fn add_skill(mut self, service_type: ServiceType) -> Self
    {
        self.skills.insert(service_type);
        self
    }

    pub fn build(self) -> Technician
    {
        Technician {
            technician_id: self.technician_id,
            name: self.name,
            status: self.status,
            skills: self.skills,
        }
    }
}

impl Technician
{
    pub fn builder(technician_id: TechnicianId) -> TechnicianBuilder
    {
        TechnicianBuilder::new(technician_id)
    }

    pub fn id(&self) -> TechnicianId
    {
        self.technician_id
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn status(&self) -> TechnicianStatus
    {
        self.status
    }

    pub fn is_active(&self) -> bool
    {
        self.status == TechnicianStatus::Active
    }

    pub fn skills(&self) -> &BTreeSet<ServiceType>
    {
        &self.skills
    }

    pub fn has_skill(&self, service_type: ServiceType) -> bool
    {
        self.skills.contains(&service_type)
    }

    pub(crate) fn set_status(&mut self, status: TechnicianStatus)
    {
        self.status = status;
    }

    /// Returns `false` when the pair already existed.
    pub(crate) fn insert_skill(&mut self, service_type: ServiceType) -> bool
    {
        self.skills.insert(service_type)
    }

    /// Returns `false` when the pair was not present.
    pub(crate) fn remove_skill(&mut self, service_type: ServiceType) -> bool
    {
        self.skills.remove(&service_type)
    }
}
