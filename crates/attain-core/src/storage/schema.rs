pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS results (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  register_number TEXT,
  course_code TEXT,
  course_title TEXT,
  semester TEXT,
  exam_date TEXT,
  invigilator_name TEXT,
  q_no TEXT,
  co TEXT,
  marks_awarded REAL,
  summary_type TEXT,
  co_attainment TEXT,
  po_attainment TEXT
);
"#;

pub const SELECT_ALL: &str = "SELECT register_number, course_code, course_title, semester, exam_date,
        invigilator_name, q_no, co, marks_awarded, summary_type, co_attainment, po_attainment
   FROM results ORDER BY id";

pub const INSERT_ROW: &str = "INSERT INTO results(register_number, course_code, course_title, semester,
        exam_date, invigilator_name, q_no, co, marks_awarded, summary_type, co_attainment, po_attainment)
   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

/// Cheapest read that still touches the table.
pub const PROBE: &str = "SELECT id FROM results LIMIT 1";
