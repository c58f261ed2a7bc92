mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use balance_core::{
    analyze_effectiveness, analyze_task_impact, assess_signal, calculate_weighted_balance,
    compute_category_balance, generate_next_cycle_tasks, Answers, Category, Comment, CycleInput,
    CyclePlan, CycleSnapshot, EffectivenessRecord, FamilyPriorities, GeneratorConfig, Party,
    PlanMode, QuestionCatalog, SubTask, Task, TaskType, WeightedBalance,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::*;

const TASK_COLUMNS: &str = "id, cycle, title, description, assigned_to, task_type, focus_area, \
                            category, insight, completed, completed_at";

/// SQLite-backed family store and cycle service.
///
/// Holds the question catalog and generator settings so that cycle planning
/// and completion need nothing beyond a family id.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    catalog: Arc<QuestionCatalog>,
    generator: GeneratorConfig,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            catalog: Arc::new(QuestionCatalog::standard()),
            generator: GeneratorConfig::default(),
        })
    }

    pub fn with_catalog(mut self, catalog: QuestionCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn generator_config(&self) -> &GeneratorConfig {
        &self.generator
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Family operations
    // ============================================================

    pub fn list_families(&self) -> Result<Vec<Family>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, party_a_name, party_b_name, current_cycle, created_at, updated_at
             FROM families ORDER BY name",
        )?;

        let families = stmt
            .query_map([], map_family)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(families)
    }

    pub fn get_family(&self, id: Uuid) -> Result<Option<Family>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let family = conn
            .query_row(
                "SELECT id, name, party_a_name, party_b_name, current_cycle, created_at, updated_at
                 FROM families WHERE id = ?",
                [id.to_string()],
                map_family,
            )
            .optional()?;
        Ok(family)
    }

    fn require_family(&self, id: Uuid) -> Result<Family> {
        self.get_family(id)?
            .ok_or_else(|| DomainError::FamilyNotFound(id).into())
    }

    pub fn create_family(&self, input: CreateFamilyInput) -> Result<Family> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::Missing("name").into());
        }
        let defaults = balance_core::PartyNames::default();
        let party_a_name = non_empty(input.party_a_name).unwrap_or(defaults.a);
        let party_b_name = non_empty(input.party_b_name).unwrap_or(defaults.b);

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO families (id, name, party_a_name, party_b_name, current_cycle, created_at, updated_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)",
            (
                id.to_string(),
                &name,
                &party_a_name,
                &party_b_name,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        tracing::info!(family = %id, "created family {}", name);

        Ok(Family {
            id,
            name,
            party_a_name,
            party_b_name,
            current_cycle: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn delete_family(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM families WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Survey operations
    // ============================================================

    /// Record one member's answers. Re-answering a question in the same cycle
    /// replaces the earlier answer.
    pub fn record_survey(&self, family_id: Uuid, input: SurveySubmission) -> Result<SurveyReceipt> {
        let family = self.require_family(family_id)?;
        let member = input.member.trim();
        if member.is_empty() {
            return Err(DomainError::Missing("member").into());
        }
        if input.answers.is_empty() {
            return Err(DomainError::Missing("answers").into());
        }
        let cycle = input.cycle.unwrap_or(family.current_cycle);

        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        for (question_id, answer) in &input.answers {
            tx.execute(
                "INSERT INTO survey_responses (family_id, cycle, member, question_id, answer, recorded_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT (family_id, cycle, member, question_id)
                 DO UPDATE SET answer = excluded.answer, recorded_at = excluded.recorded_at",
                (family_id.to_string(), cycle, member, question_id, answer, &now),
            )?;
        }
        tx.commit()?;

        tracing::debug!(family = %family_id, cycle, member, count = input.answers.len(), "recorded survey");

        Ok(SurveyReceipt {
            cycle,
            recorded: input.answers.len(),
        })
    }

    /// A cycle's answers keyed `{member}-{question}`.
    pub fn get_answers(&self, family_id: Uuid, cycle: u32) -> Result<Answers> {
        let conn = self.conn.lock().expect("database lock poisoned");
        load_answers(&conn, family_id, cycle)
    }

    /// The most recent cycle at or before `cycle` that has answers, with
    /// those answers.
    pub fn latest_answers(&self, family_id: Uuid, cycle: u32) -> Result<Option<(u32, Answers)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let latest: Option<u32> = conn.query_row(
            "SELECT MAX(cycle) FROM survey_responses WHERE family_id = ? AND cycle <= ?",
            (family_id.to_string(), cycle),
            |row| row.get(0),
        )?;

        match latest {
            Some(c) => Ok(Some((c, load_answers(&conn, family_id, c)?))),
            None => Ok(None),
        }
    }

    pub fn category_balance(&self, family_id: Uuid, cycle: Option<u32>) -> Result<BalanceReport> {
        let family = self.require_family(family_id)?;
        let cycle = cycle.unwrap_or(family.current_cycle);
        let answers = self
            .latest_answers(family_id, cycle)?
            .map(|(_, answers)| answers)
            .unwrap_or_default();

        let balances = compute_category_balance(&answers, &self.catalog);
        Ok(BalanceReport {
            cycle,
            signal: assess_signal(&balances),
            balances,
        })
    }

    pub fn weighted_balance(
        &self,
        family_id: Uuid,
        cycle: Option<u32>,
        priorities: &FamilyPriorities,
    ) -> Result<WeightedBalance> {
        let family = self.require_family(family_id)?;
        let cycle = cycle.unwrap_or(family.current_cycle);
        let answers = self
            .latest_answers(family_id, cycle)?
            .map(|(_, answers)| answers)
            .unwrap_or_default();

        Ok(calculate_weighted_balance(&self.catalog, &answers, priorities))
    }

    // ============================================================
    // Task operations
    // ============================================================

    /// Tasks of one cycle, or of every cycle when `cycle` is `None`, in
    /// generation order.
    pub fn get_tasks(&self, family_id: Uuid, cycle: Option<u32>) -> Result<Vec<Task>> {
        self.require_family(family_id)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        load_tasks(&conn, family_id, cycle)
    }

    pub fn get_task(&self, family_id: Uuid, task_id: &str) -> Result<Option<Task>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        load_task(&conn, family_id, task_id)
    }

    /// Toggle a whole task. Subtasks follow the task's state.
    pub fn set_task_completion(&self, family_id: Uuid, task_id: &str, completed: bool) -> Result<Task> {
        self.require_family(family_id)?;
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let completed_at = completed.then(|| Utc::now().to_rfc3339());
        let flag = if completed { 1 } else { 0 };

        let rows = tx.execute(
            "UPDATE tasks SET completed = ?, completed_at = ? WHERE family_id = ? AND id = ?",
            (flag, &completed_at, family_id.to_string(), task_id),
        )?;
        if rows == 0 {
            return Err(DomainError::TaskNotFound(task_id.to_string()).into());
        }
        tx.execute(
            "UPDATE sub_tasks SET completed = ?, completed_at = ? WHERE family_id = ? AND task_id = ?",
            (flag, &completed_at, family_id.to_string(), task_id),
        )?;
        tx.commit()?;

        load_task(&conn, family_id, task_id)?
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()).into())
    }

    /// Toggle one subtask. The parent task is complete exactly when all of
    /// its subtasks are.
    pub fn set_subtask_completion(
        &self,
        family_id: Uuid,
        task_id: &str,
        sub_task_id: &str,
        completed: bool,
    ) -> Result<Task> {
        self.require_family(family_id)?;
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let fid = family_id.to_string();
        let now = Utc::now().to_rfc3339();

        let rows = tx.execute(
            "UPDATE sub_tasks SET completed = ?, completed_at = ?
             WHERE family_id = ? AND task_id = ? AND id = ?",
            (
                if completed { 1 } else { 0 },
                completed.then(|| now.clone()),
                &fid,
                task_id,
                sub_task_id,
            ),
        )?;
        if rows == 0 {
            let task_exists: i32 = tx.query_row(
                "SELECT COUNT(*) FROM tasks WHERE family_id = ? AND id = ?",
                (&fid, task_id),
                |row| row.get(0),
            )?;
            return Err(if task_exists > 0 {
                DomainError::SubTaskNotFound(sub_task_id.to_string()).into()
            } else {
                DomainError::TaskNotFound(task_id.to_string()).into()
            });
        }

        let remaining: i32 = tx.query_row(
            "SELECT COUNT(*) FROM sub_tasks WHERE family_id = ? AND task_id = ? AND completed = 0",
            (&fid, task_id),
            |row| row.get(0),
        )?;
        if remaining == 0 {
            tx.execute(
                "UPDATE tasks SET completed = 1, completed_at = COALESCE(completed_at, ?)
                 WHERE family_id = ? AND id = ?",
                (&now, &fid, task_id),
            )?;
        } else {
            tx.execute(
                "UPDATE tasks SET completed = 0, completed_at = NULL WHERE family_id = ? AND id = ?",
                (&fid, task_id),
            )?;
        }
        tx.commit()?;

        load_task(&conn, family_id, task_id)?
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()).into())
    }

    pub fn add_comment(&self, family_id: Uuid, task_id: &str, input: CommentInput) -> Result<Comment> {
        if input.author.trim().is_empty() {
            return Err(DomainError::Missing("author").into());
        }
        if input.text.trim().is_empty() {
            return Err(DomainError::Missing("text").into());
        }
        self.require_family(family_id)?;
        if self.get_task(family_id, task_id)?.is_none() {
            return Err(DomainError::TaskNotFound(task_id.to_string()).into());
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author: input.author.trim().to_string(),
            text: input.text.trim().to_string(),
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO task_comments (id, family_id, task_id, author, text, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                &comment.id,
                family_id.to_string(),
                task_id,
                &comment.author,
                &comment.text,
                comment.created_at.to_rfc3339(),
            ),
        )?;

        Ok(comment)
    }

    // ============================================================
    // Meeting operations
    // ============================================================

    pub fn save_meeting_notes(
        &self,
        family_id: Uuid,
        cycle: u32,
        input: MeetingNotesInput,
    ) -> Result<MeetingNotes> {
        self.require_family(family_id)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        conn.execute(
            "INSERT INTO meeting_notes (family_id, cycle, action_items, next_cycle_goals, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (family_id, cycle) DO UPDATE SET
                action_items = excluded.action_items,
                next_cycle_goals = excluded.next_cycle_goals,
                updated_at = excluded.updated_at",
            (
                family_id.to_string(),
                cycle,
                &input.action_items,
                &input.next_cycle_goals,
                now.to_rfc3339(),
            ),
        )?;

        Ok(MeetingNotes {
            cycle,
            action_items: input.action_items,
            next_cycle_goals: input.next_cycle_goals,
            updated_at: now,
        })
    }

    pub fn get_meeting_notes(&self, family_id: Uuid, cycle: u32) -> Result<Option<MeetingNotes>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let notes = conn
            .query_row(
                "SELECT cycle, action_items, next_cycle_goals, updated_at
                 FROM meeting_notes WHERE family_id = ? AND cycle = ?",
                (family_id.to_string(), cycle),
                |row| {
                    Ok(MeetingNotes {
                        cycle: row.get(0)?,
                        action_items: row.get(1)?,
                        next_cycle_goals: row.get(2)?,
                        updated_at: parse_datetime(row.get::<_, String>(3)?),
                    })
                },
            )
            .optional()?;
        Ok(notes)
    }

    // ============================================================
    // Cycle operations
    // ============================================================

    /// Tasks for the family's current cycle, generating and storing them on
    /// first request.
    pub fn plan_current_cycle(&self, family_id: Uuid) -> Result<CyclePlan> {
        let family = self.require_family(family_id)?;
        let cycle = family.current_cycle;

        let existing = self.get_tasks(family_id, Some(cycle))?;
        if !existing.is_empty() {
            return Ok(CyclePlan {
                cycle,
                mode: plan_mode_of(&existing),
                tasks: existing,
            });
        }

        let effectiveness = self.get_effectiveness(family_id)?;
        let plan = self.generate_plan(&family, cycle, &effectiveness)?;

        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        // Another request may have stored this cycle's plan since the check above.
        let stored = load_tasks(&tx, family_id, Some(cycle))?;
        if !stored.is_empty() {
            tracing::debug!(family = %family_id, cycle, "cycle already planned");
            return Ok(CyclePlan {
                cycle,
                mode: plan_mode_of(&stored),
                tasks: stored,
            });
        }

        insert_tasks(&tx, family_id, &plan.tasks)?;
        tx.commit()?;

        tracing::info!(family = %family_id, cycle, tasks = plan.tasks.len(), "planned cycle");
        Ok(plan)
    }

    /// Close the current cycle and open the next one.
    ///
    /// Snapshots the category balance, explains its movement against the
    /// previous snapshot, recomputes effectiveness over the whole history,
    /// generates the next cycle's tasks from the latest answers and this
    /// cycle's meeting notes, and advances `current_cycle`.
    pub fn complete_cycle(&self, family_id: Uuid) -> Result<CycleTransition> {
        let family = self.require_family(family_id)?;
        let cycle = family.current_cycle;

        let all_tasks = self.get_tasks(family_id, None)?;
        let cycle_tasks: Vec<Task> = all_tasks.iter().filter(|t| t.cycle == cycle).cloned().collect();
        if cycle_tasks.is_empty() {
            return Err(DomainError::EmptyCycle(cycle).into());
        }

        let balances = self.category_balance(family_id, Some(cycle))?.balances;
        let mut history = self.get_snapshots(family_id)?;
        let impact = history
            .iter()
            .filter(|s| s.cycle < cycle)
            .max_by_key(|s| s.cycle)
            .map(|previous| analyze_task_impact(&previous.balances, &balances, &cycle_tasks))
            .unwrap_or_default();

        let snapshot = CycleSnapshot { cycle, balances };
        history.retain(|s| s.cycle != cycle);
        history.push(snapshot.clone());

        let effectiveness = analyze_effectiveness(&all_tasks, &history);
        let next_cycle = cycle + 1;
        let next_plan = self.generate_plan(&family, next_cycle, &effectiveness)?;
        let completed_at = Utc::now();

        {
            let mut conn = self.conn.lock().expect("database lock poisoned");
            let tx = conn.transaction()?;
            let fid = family_id.to_string();

            let advanced = tx.execute(
                "UPDATE families SET current_cycle = ?, updated_at = ? WHERE id = ? AND current_cycle = ?",
                (next_cycle, completed_at.to_rfc3339(), &fid, cycle),
            )?;
            if advanced == 0 {
                anyhow::bail!("Cycle {} was completed concurrently", cycle);
            }

            tx.execute(
                "INSERT INTO cycle_history (family_id, cycle, balances, impact, completed_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT (family_id, cycle) DO UPDATE SET
                    balances = excluded.balances,
                    impact = excluded.impact,
                    completed_at = excluded.completed_at",
                (
                    &fid,
                    cycle,
                    serde_json::to_string(&snapshot.balances)?,
                    serde_json::to_string(&impact)?,
                    completed_at.to_rfc3339(),
                ),
            )?;

            tx.execute("DELETE FROM effectiveness WHERE family_id = ?", [&fid])?;
            for record in &effectiveness {
                tx.execute(
                    "INSERT INTO effectiveness (family_id, task_type, effectiveness_score, sample_size, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                    (
                        &fid,
                        &record.task_type,
                        record.effectiveness_score,
                        record.sample_size,
                        completed_at.to_rfc3339(),
                    ),
                )?;
            }

            insert_tasks(&tx, family_id, &next_plan.tasks)?;
            tx.commit()?;
        }

        tracing::info!(
            family = %family_id,
            cycle,
            next_cycle,
            insights = impact.len(),
            "completed cycle"
        );

        Ok(CycleTransition {
            completed: CycleRecord {
                snapshot,
                impact,
                completed_at,
            },
            effectiveness,
            next_plan,
        })
    }

    fn generate_plan(
        &self,
        family: &Family,
        cycle: u32,
        effectiveness: &[EffectivenessRecord],
    ) -> Result<CyclePlan> {
        let answers = self
            .latest_answers(family.id, cycle)?
            .map(|(_, answers)| answers)
            .unwrap_or_default();
        let prior_tasks = self.get_tasks(family.id, None)?;
        let notes = match cycle.checked_sub(1) {
            Some(previous) if previous > 0 => self.get_meeting_notes(family.id, previous)?,
            _ => None,
        };
        let (items, goals) = notes
            .map(|n| (n.action_item_lines(), n.goal_lines()))
            .unwrap_or_default();
        let names = family.party_names();

        Ok(generate_next_cycle_tasks(
            &CycleInput {
                cycle_number: cycle,
                prior_tasks: &prior_tasks,
                answers: &answers,
                catalog: &self.catalog,
                effectiveness,
                meeting_action_items: &items,
                meeting_goals: &goals,
                party_names: &names,
            },
            &self.generator,
        ))
    }

    pub fn get_cycle_history(&self, family_id: Uuid) -> Result<Vec<CycleRecord>> {
        self.require_family(family_id)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT cycle, balances, impact, completed_at
             FROM cycle_history WHERE family_id = ? ORDER BY cycle",
        )?;

        let records = stmt
            .query_map([family_id.to_string()], |row| {
                let balances: String = row.get(1)?;
                let impact: String = row.get(2)?;
                Ok(CycleRecord {
                    snapshot: CycleSnapshot {
                        cycle: row.get(0)?,
                        balances: serde_json::from_str(&balances).unwrap_or_default(),
                    },
                    impact: serde_json::from_str(&impact).unwrap_or_default(),
                    completed_at: parse_datetime(row.get::<_, String>(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn get_snapshots(&self, family_id: Uuid) -> Result<Vec<CycleSnapshot>> {
        Ok(self
            .get_cycle_history(family_id)?
            .into_iter()
            .map(|r| r.snapshot)
            .collect())
    }

    pub fn get_effectiveness(&self, family_id: Uuid) -> Result<Vec<EffectivenessRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT task_type, effectiveness_score, sample_size
             FROM effectiveness WHERE family_id = ? ORDER BY task_type",
        )?;

        let records = stmt
            .query_map([family_id.to_string()], |row| {
                Ok(EffectivenessRecord {
                    task_type: row.get(0)?,
                    effectiveness_score: row.get(1)?,
                    sample_size: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ============================================================
    // Couple check-in operations
    // ============================================================

    /// Save a member's check-in, replacing any earlier one for the same cycle.
    pub fn save_checkin(&self, family_id: Uuid, input: CheckInInput) -> Result<CoupleCheckIn> {
        input.validate()?;
        let family = self.require_family(family_id)?;
        let cycle = input.cycle.unwrap_or(family.current_cycle);

        let conn = self.conn.lock().expect("database lock poisoned");
        let checkin = CoupleCheckIn {
            id: Uuid::new_v4(),
            family_id,
            cycle,
            member: input.member.trim().to_string(),
            ratings: input.ratings,
            strategies: input.strategies,
            notes: input.notes,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT OR REPLACE INTO couple_checkins
                (id, family_id, cycle, member, ratings, strategies, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                checkin.id.to_string(),
                family_id.to_string(),
                cycle,
                &checkin.member,
                serde_json::to_string(&checkin.ratings)?,
                serde_json::to_string(&checkin.strategies)?,
                &checkin.notes,
                checkin.created_at.to_rfc3339(),
            ),
        )?;

        Ok(checkin)
    }

    pub fn list_checkins(&self, family_id: Uuid, cycle: Option<u32>) -> Result<Vec<CoupleCheckIn>> {
        self.require_family(family_id)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, family_id, cycle, member, ratings, strategies, notes, created_at
             FROM couple_checkins WHERE family_id = ?1 AND (?2 IS NULL OR cycle = ?2)
             ORDER BY cycle, member",
        )?;

        let checkins = stmt
            .query_map((family_id.to_string(), cycle), |row| {
                let ratings: String = row.get(4)?;
                let strategies: String = row.get(5)?;
                Ok(CoupleCheckIn {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    family_id: parse_uuid(row.get::<_, String>(1)?),
                    cycle: row.get(2)?,
                    member: row.get(3)?,
                    ratings: serde_json::from_str(&ratings).unwrap_or_default(),
                    strategies: serde_json::from_str(&strategies).unwrap_or_default(),
                    notes: row.get(6)?,
                    created_at: parse_datetime(row.get::<_, String>(7)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(checkins)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            catalog: self.catalog.clone(),
            generator: self.generator.clone(),
        }
    }
}

/// `<data dir>/family-balance.db` for the current platform.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "family-balance")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("family-balance.db"))
}

fn load_answers(conn: &Connection, family_id: Uuid, cycle: u32) -> Result<Answers> {
    let mut stmt = conn.prepare(
        "SELECT member, question_id, answer FROM survey_responses
         WHERE family_id = ? AND cycle = ?",
    )?;

    let answers = stmt
        .query_map((family_id.to_string(), cycle), |row| {
            let member: String = row.get(0)?;
            let question: String = row.get(1)?;
            Ok((format!("{}-{}", member, question), row.get::<_, String>(2)?))
        })?
        .collect::<Result<Answers, _>>()?;

    Ok(answers)
}

fn load_tasks(conn: &Connection, family_id: Uuid, cycle: Option<u32>) -> Result<Vec<Task>> {
    let fid = family_id.to_string();
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks WHERE family_id = ?1 AND (?2 IS NULL OR cycle = ?2)
         ORDER BY cycle, position",
        TASK_COLUMNS
    ))?;

    let mut tasks = stmt
        .query_map((&fid, cycle), map_task)?
        .collect::<Result<Vec<_>, _>>()?;

    for task in &mut tasks {
        load_children(conn, &fid, task)?;
    }
    Ok(tasks)
}

fn load_task(conn: &Connection, family_id: Uuid, task_id: &str) -> Result<Option<Task>> {
    let fid = family_id.to_string();
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE family_id = ? AND id = ?", TASK_COLUMNS),
            (&fid, task_id),
            map_task,
        )
        .optional()?;

    match task {
        Some(mut task) => {
            load_children(conn, &fid, &mut task)?;
            Ok(Some(task))
        }
        None => Ok(None),
    }
}

fn load_children(conn: &Connection, family_id: &str, task: &mut Task) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, completed, completed_at FROM sub_tasks
         WHERE family_id = ? AND task_id = ? ORDER BY position",
    )?;
    task.sub_tasks = stmt
        .query_map((family_id, &task.id), |row| {
            Ok(SubTask {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                completed: row.get::<_, i32>(3)? != 0,
                completed_at: row.get::<_, Option<String>>(4)?.map(parse_datetime),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, author, text, created_at FROM task_comments
         WHERE family_id = ? AND task_id = ? ORDER BY created_at",
    )?;
    task.comments = stmt
        .query_map((family_id, &task.id), |row| {
            Ok(Comment {
                id: row.get(0)?,
                author: row.get(1)?,
                text: row.get(2)?,
                created_at: parse_datetime(row.get::<_, String>(3)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(())
}

fn insert_tasks(conn: &Connection, family_id: Uuid, tasks: &[Task]) -> Result<()> {
    let fid = family_id.to_string();
    for (position, task) in tasks.iter().enumerate() {
        conn.execute(
            &format!(
                "INSERT INTO tasks (family_id, position, {})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                TASK_COLUMNS
            ),
            rusqlite::params![
                &fid,
                position as i64,
                &task.id,
                task.cycle,
                &task.title,
                &task.description,
                task.assigned_to.as_str(),
                task.task_type.as_str(),
                &task.focus_area,
                task.category.map(|c| c.as_str()),
                &task.insight,
                if task.completed { 1 } else { 0 },
                task.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        for (sub_position, sub) in task.sub_tasks.iter().enumerate() {
            conn.execute(
                "INSERT INTO sub_tasks
                    (family_id, task_id, id, position, title, description, completed, completed_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    &fid,
                    &task.id,
                    &sub.id,
                    sub_position as i64,
                    &sub.title,
                    &sub.description,
                    if sub.completed { 1 } else { 0 },
                    sub.completed_at.map(|t| t.to_rfc3339()),
                ),
            )?;
        }

        for comment in &task.comments {
            conn.execute(
                "INSERT INTO task_comments (id, family_id, task_id, author, text, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    &comment.id,
                    &fid,
                    &task.id,
                    &comment.author,
                    &comment.text,
                    comment.created_at.to_rfc3339(),
                ),
            )?;
        }
    }
    Ok(())
}

fn map_family(row: &rusqlite::Row<'_>) -> rusqlite::Result<Family> {
    Ok(Family {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        party_a_name: row.get(2)?,
        party_b_name: row.get(3)?,
        current_cycle: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn map_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        cycle: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        assigned_to: Party::from_str(&row.get::<_, String>(4)?).unwrap_or(Party::A),
        task_type: TaskType::from_str(&row.get::<_, String>(5)?).unwrap_or(TaskType::Ai),
        focus_area: row.get(6)?,
        category: row
            .get::<_, Option<String>>(7)?
            .and_then(|c| Category::from_str(&c)),
        insight: row.get(8)?,
        completed: row.get::<_, i32>(9)? != 0,
        completed_at: row.get::<_, Option<String>>(10)?.map(parse_datetime),
        sub_tasks: Vec::new(),
        comments: Vec::new(),
    })
}

/// Stored plans don't record their mode; a plan made only of generic
/// check-ins was a fallback.
fn plan_mode_of(tasks: &[Task]) -> PlanMode {
    if tasks.iter().all(|t| t.id.contains("-default-")) {
        PlanMode::Fallback
    } else {
        PlanMode::Normal
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
