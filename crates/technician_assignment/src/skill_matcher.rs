use std::collections::BTreeMap;

use scheduling_environment::ServiceType;
use scheduling_environment::TechnicianId;
use scheduling_environment::store::SchedulingStore;
use scheduling_environment::technician::Technician;
use serde::Serialize;
use tracing::info;

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeCoverage
{
    pub service_type: ServiceType,
    pub technician_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapReport
{
    /// Coverage `<= under_threshold`, ascending by count.
    pub underrepresented: Vec<ServiceTypeCoverage>,
    /// Coverage `>= over_threshold`, descending by count.
    pub overrepresented: Vec<ServiceTypeCoverage>,
    pub technicians_without_skills: Vec<TechnicianId>,
    pub single_skill_technicians: Vec<TechnicianId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianVersatility
{
    pub technician_id: TechnicianId,
    pub skill_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersatilityReport
{
    /// Descending by skill count, ties by ascending id.
    pub ranking: Vec<TechnicianVersatility>,
    /// Training gap.
    pub untrained: Vec<TechnicianId>,
    /// Cross-training candidates.
    pub single_skill: Vec<TechnicianId>,
}

pub struct SkillMatcher<'a>
{
    store: &'a SchedulingStore,
}

impl<'a> SkillMatcher<'a>
{
    pub fn new(store: &'a SchedulingStore) -> Self
    {
        Self { store }
    }

    /// Technicians holding `service_type`, ordered by id. Status is not
    /// considered here.
    pub fn qualified_technicians(&self, service_type: ServiceType) -> Vec<Technician>
    {
        self.store
            .technicians()
            .into_iter()
            .filter(|technician| technician.has_skill(service_type))
            .collect()
    }

    pub fn assign_skill(&self, technician_id: TechnicianId, service_type: ServiceType) -> Result<()>
    {
        self.store.assign_skill(technician_id, service_type)?;
        info!(technician_id, %service_type, "skill assigned");
        Ok(())
    }

    pub fn remove_skill(&self, technician_id: TechnicianId, service_type: ServiceType) -> Result<()>
    {
        self.store.remove_skill(technician_id, service_type)?;
        info!(technician_id, %service_type, "skill removed");
        Ok(())
    }

    /// Number of technicians per service type, including uncovered types.
    pub fn coverage(&self) -> Vec<ServiceTypeCoverage>
    {
        coverage_of(&self.store.technicians())
    }

    pub fn skill_gap_analysis(&self, under_threshold: usize, over_threshold: usize) -> SkillGapReport
    {
        let technicians = self.store.technicians();
        let coverage = coverage_of(&technicians);

        let mut underrepresented = coverage
            .iter()
            .filter(|entry| entry.technician_count <= under_threshold)
            .copied()
            .collect::<Vec<_>>();
        underrepresented.sort_by_key(|entry| (entry.technician_count, entry.service_type));

        let mut overrepresented = coverage
            .iter()
            .filter(|entry| entry.technician_count >= over_threshold)
            .copied()
            .collect::<Vec<_>>();
        overrepresented.sort_by(|a, b| {
            b.technician_count
                .cmp(&a.technician_count)
                .then(a.service_type.cmp(&b.service_type))
        });

        SkillGapReport {
            underrepresented,
            overrepresented,
            technicians_without_skills: ids_with_skill_count(&technicians, 0),
            single_skill_technicians: ids_with_skill_count(&technicians, 1),
        }
    }

    pub fn versatility_ranking(&self) -> VersatilityReport
    {
        let technicians = self.store.technicians();

        let mut ranking = technicians
            .iter()
            .map(|technician| TechnicianVersatility {
                technician_id: technician.id(),
                skill_count: technician.skills().len(),
            })
            .collect::<Vec<_>>();
        ranking.sort_by(|a, b| b.skill_count.cmp(&a.skill_count).then(a.technician_id.cmp(&b.technician_id)));

        VersatilityReport {
            ranking,
            untrained: ids_with_skill_count(&technicians, 0),
            single_skill: ids_with_skill_count(&technicians, 1),
        }
    }
}

/// Every service type with the number of distinct technicians holding it.
pub fn coverage_of(technicians: &[Technician]) -> Vec<ServiceTypeCoverage>
{
    let mut counts = ServiceType::ALL
        .iter()
        .map(|service_type| (*service_type, 0))
        .collect::<BTreeMap<_, _>>();
    for technician in technicians {
        for service_type in technician.skills() {
            *counts.entry(*service_type).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(service_type, technician_count)| ServiceTypeCoverage {
            service_type,
            technician_count,
        })
        .collect()
}

fn ids_with_skill_count(technicians: &[Technician], skill_count: usize) -> Vec<TechnicianId>
{
    technicians
        .iter()
        .filter(|technician| technician.skills().len() == skill_count)
        .map(Technician::id)
        .collect()
}
