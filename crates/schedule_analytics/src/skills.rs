use std::collections::BTreeMap;

use scheduling_environment::ServiceType;
use scheduling_environment::store::StoreSnapshot;
use serde::Serialize;
use technician_assignment::skill_matcher::coverage_of;

use crate::config::AnalyticsConfig;

/// How many technicians back up a service type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedundancyLevel
{
    None,
    Critical,
    Low,
    Adequate,
    High,
}

impl RedundancyLevel
{
    pub fn classify(technician_count: usize, config: &AnalyticsConfig) -> Self
    {
        match technician_count {
            0 => RedundancyLevel::None,
            1 => RedundancyLevel::Critical,
            count if count < config.adequate_redundancy => RedundancyLevel::Low,
            count if count < config.high_redundancy => RedundancyLevel::Adequate,
            _ => RedundancyLevel::High,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRedundancy
{
    pub service_type: ServiceType,
    pub technician_count: usize,
    pub redundancy_level: RedundancyLevel,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCoverageStatistics
{
    pub total_technicians: usize,
    pub total_skill_types: usize,
    pub total_skill_assignments: usize,
    /// Technicians per service type, uncovered types included.
    pub skill_counts: BTreeMap<ServiceType, usize>,
    pub redundancy: Vec<SkillRedundancy>,
    pub average_technicians_per_skill: f64,
    pub average_skills_per_technician: f64,
    pub skill_utilization_rate: f64,
}

pub(crate) fn skill_coverage(snapshot: &StoreSnapshot, config: &AnalyticsConfig) -> SkillCoverageStatistics
{
    let technicians = snapshot.technicians();
    let coverage = coverage_of(technicians);

    let total_technicians = technicians.len();
    let total_skill_types = ServiceType::ALL.len();
    let total_skill_assignments = technicians.iter().map(|technician| technician.skills().len()).sum::<usize>();

    let ratio = |numerator: usize, denominator: usize| {
        if denominator == 0 {
            0.0
        } else {
            numerator as f64 / denominator as f64
        }
    };

    SkillCoverageStatistics {
        total_technicians,
        total_skill_types,
        total_skill_assignments,
        skill_counts: coverage
            .iter()
            .map(|entry| (entry.service_type, entry.technician_count))
            .collect(),
        redundancy: coverage
            .iter()
            .map(|entry| SkillRedundancy {
                service_type: entry.service_type,
                technician_count: entry.technician_count,
                redundancy_level: RedundancyLevel::classify(entry.technician_count, config),
            })
            .collect(),
        average_technicians_per_skill: ratio(total_skill_assignments, total_skill_types),
        average_skills_per_technician: ratio(total_skill_assignments, total_technicians),
        skill_utilization_rate: ratio(total_skill_assignments, total_technicians * total_skill_types),
    }
}

#[cfg(test)]
mod tests
{
    use scheduling_environment::ServiceType;
    use scheduling_environment::store::StoreSnapshot;
    use scheduling_environment::technician::Technician;

    use super::RedundancyLevel;
    use super::skill_coverage;
    use crate::config::AnalyticsConfig;

    #[test]
    fn test_redundancy_buckets()
    {
        let config = AnalyticsConfig::default();
        let levels = (0..7).map(|count| RedundancyLevel::classify(count, &config)).collect::<Vec<_>>();

        assert_eq!(
            levels,
            vec![
                RedundancyLevel::None,
                RedundancyLevel::Critical,
                RedundancyLevel::Low,
                RedundancyLevel::Adequate,
                RedundancyLevel::Adequate,
                RedundancyLevel::High,
                RedundancyLevel::High,
            ]
        );
    }

    #[test]
    fn test_coverage_ratios()
    {
        let technicians = vec![
            Technician::builder(1)
                .add_skill(ServiceType::Hardware)
                .add_skill(ServiceType::Network)
                .build(),
            Technician::builder(2).add_skill(ServiceType::Hardware).build(),
            Technician::builder(3).build(),
        ];
        let snapshot = StoreSnapshot::from_parts(technicians, vec![], vec![], vec![]);

        let statistics = skill_coverage(&snapshot, &AnalyticsConfig::default());

        assert_eq!(statistics.total_technicians, 3);
        assert_eq!(statistics.total_skill_types, 6);
        assert_eq!(statistics.total_skill_assignments, 3);
        assert_eq!(statistics.skill_counts.get(&ServiceType::Hardware), Some(&2));
        assert_eq!(statistics.skill_counts.get(&ServiceType::Security), Some(&0));
        assert_eq!(statistics.skill_counts.len(), 6);
        assert!((statistics.average_technicians_per_skill - 0.5).abs() < 1e-9);
        assert!((statistics.average_skills_per_technician - 1.0).abs() < 1e-9);
        assert!((statistics.skill_utilization_rate - 3.0 / 18.0).abs() < 1e-9);

        let hardware = statistics
            .redundancy
            .iter()
            .find(|entry| entry.service_type == ServiceType::Hardware)
            .unwrap();
        assert_eq!(hardware.redundancy_level, RedundancyLevel::Low);
    }

    #[test]
    fn test_no_technicians_gives_zero_rates()
    {
        let statistics = skill_coverage(&StoreSnapshot::default(), &AnalyticsConfig::default());

        assert_eq!(statistics.total_technicians, 0);
        assert_eq!(statistics.skill_utilization_rate, 0.0);
        assert_eq!(statistics.average_skills_per_technician, 0.0);
    }
}
