use std::collections::BTreeMap;

use balance_core::{BalanceSignal, Category, InsightKind, Party, PlanMode, TaskType};
use family_balance::db::Database;
use family_balance::error::DomainError;
use family_balance::models::*;
use speculate2::speculate;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn create_test_family(db: &Database) -> Family {
    db.create_family(CreateFamilyInput {
        name: "Rivera".to_string(),
        party_a_name: Some("Sam".to_string()),
        party_b_name: Some("Alex".to_string()),
    })
    .expect("Failed to create family")
}

fn submit(db: &Database, family: &Family, cycle: u32, member: &str, pairs: &[(&str, &str)]) {
    let answers: BTreeMap<String, String> = pairs
        .iter()
        .map(|(q, a)| (q.to_string(), a.to_string()))
        .collect();
    db.record_survey(
        family.id,
        SurveySubmission {
            member: member.to_string(),
            cycle: Some(cycle),
            answers,
        },
    )
    .expect("Failed to record survey");
}

fn domain_error(err: &anyhow::Error) -> &DomainError {
    err.downcast_ref::<DomainError>()
        .expect("Expected a domain error")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "families" {
        it "creates a family at cycle 1 with default party names" {
            let family = db.create_family(CreateFamilyInput {
                name: "Okafor".to_string(),
                party_a_name: None,
                party_b_name: Some("  ".to_string()),
            }).expect("Failed to create family");

            assert_eq!(family.current_cycle, 1);
            assert_eq!(family.party_a_name, "Party A");
            assert_eq!(family.party_b_name, "Party B");
        }

        it "rejects an empty name" {
            let err = db.create_family(CreateFamilyInput {
                name: " ".to_string(),
                party_a_name: None,
                party_b_name: None,
            }).unwrap_err();
            assert!(matches!(domain_error(&err), DomainError::Missing("name")));
        }

        it "lists families ordered by name" {
            create_test_family(&db);
            db.create_family(CreateFamilyInput {
                name: "Adams".to_string(),
                party_a_name: None,
                party_b_name: None,
            }).expect("Failed to create");

            let names: Vec<String> = db.list_families().expect("Query failed")
                .into_iter().map(|f| f.name).collect();
            assert_eq!(names, vec!["Adams", "Rivera"]);
        }

        it "returns None for a non-existent family" {
            assert!(db.get_family(Uuid::new_v4()).expect("Query failed").is_none());
        }

        it "deletes a family with its data" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A")]);
            db.plan_current_cycle(family.id).expect("Failed to plan");

            assert!(db.delete_family(family.id).expect("Delete failed"));
            assert!(!db.delete_family(family.id).expect("Delete failed"));
            let err = db.get_tasks(family.id, None).unwrap_err();
            assert!(matches!(domain_error(&err), DomainError::FamilyNotFound(_)));
        }
    }

    describe "surveys" {
        it "keys stored answers by member and question" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A"), ("q21", "B")]);
            submit(&db, &family, 1, "alex", &[("q1", "B")]);

            let answers = db.get_answers(family.id, 1).expect("Query failed");
            assert_eq!(answers.len(), 3);
            assert_eq!(answers.get("sam-q1").map(String::as_str), Some("A"));
            assert_eq!(answers.get("alex-q1").map(String::as_str), Some("B"));
        }

        it "replaces an answer given twice in the same cycle" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A")]);
            submit(&db, &family, 1, "sam", &[("q1", "B")]);

            let answers = db.get_answers(family.id, 1).expect("Query failed");
            assert_eq!(answers.len(), 1);
            assert_eq!(answers.get("sam-q1").map(String::as_str), Some("B"));
        }

        it "finds the latest answered cycle at or before a cycle" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A")]);
            submit(&db, &family, 3, "sam", &[("q2", "B")]);

            let (cycle, _) = db.latest_answers(family.id, 2).expect("Query failed").unwrap();
            assert_eq!(cycle, 1);
            let (cycle, answers) = db.latest_answers(family.id, 5).expect("Query failed").unwrap();
            assert_eq!(cycle, 3);
            assert!(answers.contains_key("sam-q2"));
            assert!(db.latest_answers(family.id, 0).expect("Query failed").is_none());
        }

        it "rejects a submission without answers" {
            let family = create_test_family(&db);
            let err = db.record_survey(family.id, SurveySubmission {
                member: "sam".to_string(),
                cycle: None,
                answers: BTreeMap::new(),
            }).unwrap_err();
            assert!(matches!(domain_error(&err), DomainError::Missing("answers")));
        }
    }

    describe "category_balance" {
        it "reports no signal before any survey" {
            let family = create_test_family(&db);
            let report = db.category_balance(family.id, None).expect("Query failed");

            assert_eq!(report.cycle, 1);
            assert_eq!(report.signal, BalanceSignal::Insufficient);
            assert!(report.balances.iter().all(|b| b.imbalance == 0));
        }

        it "scores both members' answers together" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A"), ("q2", "A")]);
            submit(&db, &family, 1, "alex", &[("q1", "A"), ("q2", "B")]);

            let report = db.category_balance(family.id, None).expect("Query failed");
            assert_eq!(report.signal, BalanceSignal::Measured);
            assert_eq!(report.balances[0].party_a_percent, 75);
            assert_eq!(report.balances[0].answered, 4);
        }

        it "computes weighted balance from the same answers" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A"), ("q61", "B")]);

            let weighted = db.weighted_balance(family.id, None, &Default::default())
                .expect("Query failed");
            assert_eq!(weighted.categories.len(), 2);
        }
    }

    describe "planning" {
        it "falls back to check-ins without survey data" {
            let family = create_test_family(&db);
            let plan = db.plan_current_cycle(family.id).expect("Failed to plan");

            assert_eq!(plan.mode, PlanMode::Fallback);
            assert_eq!(plan.tasks.len(), 2);
            assert_eq!(plan.tasks[0].title, "Week 1: Sam's Family Check-in");
        }

        it "generates and stores tasks once per cycle" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A"), ("q2", "A"), ("q21", "B")]);

            let plan = db.plan_current_cycle(family.id).expect("Failed to plan");
            assert_eq!(plan.mode, PlanMode::Normal);
            assert_eq!(plan.tasks.len(), 4);

            let again = db.plan_current_cycle(family.id).expect("Failed to plan");
            assert_eq!(again.tasks, plan.tasks);
            assert_eq!(again.mode, PlanMode::Normal);

            let stored = db.get_tasks(family.id, Some(1)).expect("Query failed");
            assert_eq!(stored, plan.tasks);
        }

        it "stores one plan when planning concurrently" {
            let families: Vec<Family> = (0..50).map(|_| create_test_family(&db)).collect();
            for family in families.iter().step_by(2) {
                submit(&db, family, 1, "sam", &[("q1", "A"), ("q61", "B")]);
            }

            std::thread::scope(|scope| {
                for family in &families {
                    let handles: Vec<_> = (0..2)
                        .map(|_| {
                            let db = db.clone();
                            scope.spawn(move || db.plan_current_cycle(family.id))
                        })
                        .collect();
                    let plans: Vec<_> = handles
                        .into_iter()
                        .map(|h| h.join().expect("Planner thread panicked").expect("Failed to plan"))
                        .collect();
                    assert_eq!(plans[0].tasks, plans[1].tasks);
                }
            });

            for family in &families {
                let plan = db.plan_current_cycle(family.id).expect("Failed to plan");
                let stored = db.get_tasks(family.id, None).expect("Query failed");
                assert_eq!(stored, plan.tasks);
            }
        }
    }

    describe "task completion" {
        it "completes a task when its last subtask completes" {
            let family = create_test_family(&db);
            let plan = db.plan_current_cycle(family.id).expect("Failed to plan");
            let task = &plan.tasks[0];
            let sub_ids: Vec<String> = task.sub_tasks.iter().map(|s| s.id.clone()).collect();

            let updated = assert_ok!(db.set_subtask_completion(family.id, &task.id, &sub_ids[0], true));
            assert!(updated.sub_tasks[0].completed);
            assert!(!updated.completed);

            for id in &sub_ids[1..] {
                db.set_subtask_completion(family.id, &task.id, id, true).expect("Update failed");
            }
            let done = db.get_task(family.id, &task.id).expect("Query failed").unwrap();
            assert!(done.completed);
            assert!(done.completed_at.is_some());

            let reopened = assert_ok!(db.set_subtask_completion(family.id, &task.id, &sub_ids[1], false));
            assert!(!reopened.completed);
            assert!(reopened.completed_at.is_none());
        }

        it "applies a task toggle to all subtasks" {
            let family = create_test_family(&db);
            let plan = db.plan_current_cycle(family.id).expect("Failed to plan");

            let task = assert_ok!(db.set_task_completion(family.id, &plan.tasks[1].id, true));
            assert!(task.completed);
            assert!(task.sub_tasks.iter().all(|s| s.completed));

            let task = assert_ok!(db.set_task_completion(family.id, &plan.tasks[1].id, false));
            assert!(task.sub_tasks.iter().all(|s| !s.completed));
        }

        it "distinguishes unknown tasks from unknown subtasks" {
            let family = create_test_family(&db);
            let plan = db.plan_current_cycle(family.id).expect("Failed to plan");

            let err = assert_err!(db.set_subtask_completion(family.id, "9-9", "9-9-1", true));
            assert!(matches!(domain_error(&err), DomainError::TaskNotFound(_)));

            let err = assert_err!(db.set_subtask_completion(family.id, &plan.tasks[0].id, "nope", true));
            assert!(matches!(domain_error(&err), DomainError::SubTaskNotFound(_)));
        }

        it "attaches comments to a task" {
            let family = create_test_family(&db);
            let plan = db.plan_current_cycle(family.id).expect("Failed to plan");

            let comment = db.add_comment(family.id, &plan.tasks[0].id, CommentInput {
                author: "Sam".to_string(),
                text: "Started on Tuesday".to_string(),
            }).expect("Failed to comment");

            let task = db.get_task(family.id, &plan.tasks[0].id).expect("Query failed").unwrap();
            assert_eq!(task.comments.len(), 1);
            assert_eq!(task.comments[0].id, comment.id);
        }
    }

    describe "complete_cycle" {
        it "rejects a cycle without tasks" {
            let family = create_test_family(&db);
            let err = db.complete_cycle(family.id).unwrap_err();
            assert!(matches!(domain_error(&err), DomainError::EmptyCycle(1)));
        }

        it "snapshots balance and opens the next cycle" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A"), ("q2", "A"), ("q3", "A")]);
            db.plan_current_cycle(family.id).expect("Failed to plan");

            let transition = db.complete_cycle(family.id).expect("Failed to complete");
            assert_eq!(transition.completed.snapshot.cycle, 1);
            assert_eq!(transition.completed.snapshot.balances[0].party_a_percent, 100);
            assert!(transition.completed.impact.is_empty());
            assert_eq!(transition.next_plan.cycle, 2);

            let family = db.get_family(family.id).expect("Query failed").unwrap();
            assert_eq!(family.current_cycle, 2);

            let next = db.get_tasks(family.id, Some(2)).expect("Query failed");
            assert_eq!(next, transition.next_plan.tasks);
            let survey_b = next.iter().find(|t| t.id == "2-2").unwrap();
            assert_eq!(survey_b.assigned_to, Party::B);
            assert_eq!(survey_b.focus_area.as_deref(), Some("Cleaning Coordination"));

            let history = db.get_cycle_history(family.id).expect("Query failed");
            assert_eq!(history.len(), 1);
        }

        it "turns meeting notes into next-cycle tasks" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A")]);
            db.plan_current_cycle(family.id).expect("Failed to plan");
            db.save_meeting_notes(family.id, 1, MeetingNotesInput {
                action_items: "- Alex books the dentist\n- Fix the fence\n".to_string(),
                next_cycle_goals: "Eat together twice".to_string(),
            }).expect("Failed to save notes");

            let transition = db.complete_cycle(family.id).expect("Failed to complete");
            let tasks = &transition.next_plan.tasks;

            assert_eq!(tasks[0].id, "2-meeting-1");
            assert_eq!(tasks[0].assigned_to, Party::B);
            assert_eq!(tasks[1].description, "Fix the fence");
            assert_eq!(tasks[1].assigned_to, Party::A);

            let goal = tasks.last().unwrap();
            assert_eq!(goal.task_type, TaskType::Goal);
            assert_eq!(goal.sub_tasks[0].description, "Eat together twice");
        }

        it "explains improvement against the previous snapshot" {
            let family = create_test_family(&db);
            submit(&db, &family, 1, "sam", &[("q1", "A"), ("q2", "A"), ("q3", "A"), ("q4", "A")]);
            db.plan_current_cycle(family.id).expect("Failed to plan");
            db.complete_cycle(family.id).expect("Failed to complete");

            submit(&db, &family, 2, "sam", &[("q1", "A"), ("q2", "B")]);
            db.set_task_completion(family.id, "2-2", true).expect("Failed to complete task");

            let transition = db.complete_cycle(family.id).expect("Failed to complete");
            let insight = transition.completed.impact.iter()
                .find(|i| i.category == Category::VisibleHousehold)
                .expect("Missing insight");
            assert_eq!(insight.kind, InsightKind::Success);
            assert_eq!(insight.improvement, 50);

            let stored = db.get_effectiveness(family.id).expect("Query failed");
            assert_eq!(stored, transition.effectiveness);
            assert_eq!(db.get_cycle_history(family.id).expect("Query failed").len(), 2);
        }
    }

    describe "couple check-ins" {
        it "keeps one check-in per member per cycle" {
            let family = create_test_family(&db);
            let mut strategies = BTreeMap::new();
            let mut progress = StrategyProgress::default();
            progress.set_implementation(60).expect("Invalid value");
            strategies.insert(Strategy::DateNights, progress);

            let input = CheckInInput {
                member: "Sam".to_string(),
                cycle: None,
                ratings: CheckInRatings::default(),
                strategies,
                notes: None,
            };
            db.save_checkin(family.id, input.clone()).expect("Failed to save");
            db.save_checkin(family.id, CheckInInput {
                ratings: CheckInRatings { satisfaction: 5, ..Default::default() },
                ..input
            }).expect("Failed to save");

            let checkins = db.list_checkins(family.id, Some(1)).expect("Query failed");
            assert_eq!(checkins.len(), 1);
            assert_eq!(checkins[0].ratings.satisfaction, 5);
            assert_eq!(checkins[0].strategies[&Strategy::DateNights].implementation, 60);
        }

        it "rejects ratings outside 1 to 5" {
            let family = create_test_family(&db);
            let err = db.save_checkin(family.id, CheckInInput {
                member: "Sam".to_string(),
                cycle: None,
                ratings: CheckInRatings { appreciation: 0, ..Default::default() },
                strategies: BTreeMap::new(),
                notes: None,
            }).unwrap_err();
            assert!(matches!(domain_error(&err), DomainError::OutOfRange { field: "appreciation", .. }));
        }
    }

    describe "file-backed database" {
        it "persists across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("family.db");

            let id = {
                let db = Database::open(path.clone()).expect("Failed to open");
                db.migrate().expect("Failed to migrate");
                create_test_family(&db).id
            };

            let reopened = Database::open(path).expect("Failed to reopen");
            reopened.migrate().expect("Failed to migrate");
            let family = reopened.get_family(id).expect("Query failed").unwrap();
            assert_eq!(family.party_b_name, "Alex");
        }
    }
}
