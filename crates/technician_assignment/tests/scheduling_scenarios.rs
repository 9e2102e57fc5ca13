use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Barrier;

use chrono::TimeZone;
use chrono::Utc;
use scheduling_environment::Instant;
use scheduling_environment::ServiceType;
use scheduling_environment::appointment::AppointmentStatus;
use scheduling_environment::store::SchedulingStore;
use scheduling_environment::technician::Technician;
use scheduling_environment::ticket::Ticket;
use scheduling_environment::ticket::TicketStatus;
use technician_assignment::SchedulingEngine;
use technician_assignment::config::EngineConfig;
use technician_assignment::error::SchedulingError;

fn init_tracing()
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn get_test_data_path(filename: &str) -> PathBuf
{
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(filename)
}

fn at(hour: u32, minute: u32) -> Instant
{
    Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
}

fn load_engine() -> SchedulingEngine
{
    load_engine_with(EngineConfig::default())
}

fn load_engine_with(config: EngineConfig) -> SchedulingEngine
{
    init_tracing();
    let technicians_json = fs::read_to_string(get_test_data_path("technicians.json")).expect("Failed to read technicians.json");
    let technicians: Vec<Technician> = serde_json::from_str(&technicians_json).expect("Failed to parse technicians.json");

    let store = SchedulingStore::new();
    for technician in technicians {
        store.add_technician(technician).expect("Duplicate technician in fixture");
    }
    store.add_ticket(Ticket::new(100, 1, ServiceType::Hardware)).unwrap();
    store.add_ticket(Ticket::new(101, 1, ServiceType::Software)).unwrap();
    store.add_ticket(Ticket::new(102, 2, ServiceType::Network)).unwrap();

    SchedulingEngine::new(Arc::new(store), config).unwrap()
}

#[test]
fn test_booking_around_a_confirmed_appointment()
{
    let engine = load_engine();
    let selector = engine.selector();

    let existing = selector.schedule_appointment(100, 1, at(9, 0), at(10, 0)).unwrap();
    selector.confirm(existing.id()).unwrap();

    assert!(matches!(
        selector.schedule_appointment(100, 1, at(9, 30), at(10, 30)),
        Err(SchedulingError::SchedulingConflict { technician_id: 1, .. })
    ));
    // Touching the end of the existing booking still conflicts.
    assert!(matches!(
        selector.schedule_appointment(100, 1, at(10, 0), at(11, 0)),
        Err(SchedulingError::SchedulingConflict { technician_id: 1, .. })
    ));

    let booked = selector.schedule_appointment(100, 1, at(10, 1), at(11, 0)).unwrap();
    assert_eq!(booked.status(), AppointmentStatus::Pending);
    assert_eq!(booked.technician_id(), 1);
    assert_eq!(engine.availability().compute_workload(1).unwrap(), 2);
}

#[test]
fn test_overlap_detection_is_symmetric()
{
    let intervals = [
        (at(9, 0), at(10, 0)),
        (at(10, 0), at(11, 0)),
        (at(10, 1), at(11, 0)),
        (at(8, 0), at(12, 0)),
        (at(9, 15), at(9, 45)),
    ];

    for (a_start, a_end) in intervals {
        for (b_start, b_end) in intervals {
            let forward = {
                let engine = load_engine();
                engine.selector().schedule_appointment(100, 1, a_start, a_end).unwrap();
                engine.conflicts().is_available(1, b_start, b_end).unwrap()
            };
            let backward = {
                let engine = load_engine();
                engine.selector().schedule_appointment(100, 1, b_start, b_end).unwrap();
                engine.conflicts().is_available(1, a_start, a_end).unwrap()
            };
            assert_eq!(forward, backward, "{a_start}-{a_end} vs {b_start}-{b_end}");
        }
    }
}

#[test]
fn test_unskilled_technician_is_never_selected()
{
    let engine = load_engine();

    for ticket_id in [100, 101, 102] {
        for _ in 0..3 {
            match engine.selector().select_technician(ticket_id, 5) {
                Ok(technician) => assert_ne!(technician.id(), 2),
                Err(error) => assert!(matches!(error, SchedulingError::NoQualifiedTechnician { .. })),
            }
        }
    }

    // Only inactive technicians hold SOFTWARE.
    assert_eq!(
        engine.selector().select_technician(101, 5),
        Err(SchedulingError::NoQualifiedTechnician {
            service_type: ServiceType::Software
        })
    );

    let gaps = engine.skills().skill_gap_analysis(0, 3);
    assert_eq!(gaps.technicians_without_skills, vec![2]);
    assert_eq!(engine.skills().versatility_ranking().untrained, vec![2]);
}

#[test]
fn test_selection_is_deterministic()
{
    let engine = load_engine();

    let first = engine.selector().select_technician(100, 5).unwrap();
    for _ in 0..10 {
        assert_eq!(engine.selector().select_technician(100, 5).unwrap(), first);
    }
    assert_eq!(first.id(), 1);
}

#[test]
fn test_concurrent_overlapping_bookings_on_one_technician()
{
    let engine = load_engine();
    let attempts = 8;
    let barrier = Barrier::new(attempts + 1);

    let (results, other) = std::thread::scope(|scope| {
        let handles = (0..attempts)
            .map(|offset| {
                let engine = engine.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let start = at(9, offset as u32 * 5);
                    engine.selector().schedule_appointment(100, 1, start, start + chrono::Duration::hours(1))
                })
            })
            .collect::<Vec<_>>();

        // A different technician is never blocked by technician 1.
        let other = {
            let engine = engine.clone();
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                engine.selector().schedule_appointment(100, 3, at(9, 0), at(10, 0))
            })
        };

        let results = handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>();
        (results, other.join().unwrap())
    });

    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|error| matches!(error, SchedulingError::SchedulingConflict { .. }))
    );
    assert!(other.is_ok());

    let snapshot = engine.store().snapshot();
    assert_eq!(snapshot.appointments().iter().filter(|a| a.technician_id() == 1).count(), 1);
    assert_eq!(snapshot.appointments().len(), 2);
}

#[test]
fn test_snapshot_sees_whole_commits_under_load()
{
    let engine = load_engine_with(EngineConfig {
        enforce_workload_ceiling_on_schedule: false,
        ..EngineConfig::default()
    });

    let slot_start = |slot: u32| at(0, 0) + chrono::Duration::hours(i64::from(slot) * 2);

    std::thread::scope(|scope| {
        for technician_id in [1, 3] {
            let engine = engine.clone();
            scope.spawn(move || {
                for slot in 0..20u32 {
                    let start = slot_start(slot);
                    engine
                        .selector()
                        .schedule_appointment(100, technician_id, start, start + chrono::Duration::hours(1))
                        .unwrap_or_else(|error| panic!("{error}"));
                }
            });
        }

        for ticket_id in [101, 102] {
            let engine = engine.clone();
            scope.spawn(move || {
                for step in 0..40u32 {
                    let status = if step % 2 == 0 { TicketStatus::Closed } else { TicketStatus::Open };
                    let when = at(0, 0) + chrono::Duration::minutes(i64::from(step));
                    engine.tickets().change_status(ticket_id, status, 9, when).unwrap();
                }
            });
        }

        let engine = engine.clone();
        scope.spawn(move || {
            for _ in 0..50 {
                let snapshot = engine.store().snapshot();

                // A ticket's status and its latest history entry move together.
                for ticket in snapshot.tickets() {
                    let latest = snapshot.history().iter().rfind(|entry| entry.ticket_id() == ticket.id());
                    match latest {
                        Some(entry) => assert_eq!(entry.status(), ticket.status(), "ticket {}", ticket.id()),
                        None => assert_eq!(ticket.status(), TicketStatus::Open),
                    }
                }

                // Each technician's bookings are a prefix of the order they were made in.
                for technician_id in [1, 3] {
                    let mut starts = snapshot
                        .appointments()
                        .iter()
                        .filter(|appointment| appointment.technician_id() == technician_id)
                        .map(|appointment| appointment.interval().start())
                        .collect::<Vec<_>>();
                    starts.sort();
                    let expected = (0..starts.len() as u32).map(slot_start).collect::<Vec<_>>();
                    assert_eq!(starts, expected, "technician {technician_id}");
                }
            }
        });
    });

    let snapshot = engine.store().snapshot();
    assert_eq!(snapshot.history().len(), 80);
    assert!(snapshot.tickets().iter().filter(|ticket| ticket.id() != 100).all(|ticket| ticket.status() == TicketStatus::Open));
    assert_eq!(engine.store().snapshot().appointments().len(), 40);
}
