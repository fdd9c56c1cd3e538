//! Prompt builders for every model-backed role.
//!
//! Plain functions producing the full prompt text. Structured-output
//! roles instruct the model to answer with a bare JSON object; providers
//! strip accidental markdown fences before parsing.

use crate::{SqlGeneration, TableContext};

/// Prompt for the SQL generation role.
pub fn sql_generation(input: &SqlGeneration) -> String {
    format!(
        r#"You are a SQL query generator. Given a natural language question, generate a SQLite query that answers it.

Rules:
1. Use the EXACT table and column names from the provided schema. Do not change casing. If the schema quotes an identifier (e.g. "TableName"), you MUST quote it too.
2. Give every calculated value (MAX, COUNT, AVG, ...) a readable alias, e.g. SELECT MAX(price) AS highest_price.
3. If numbers are stored as text (e.g. '1,200.50'), use REPLACE and CAST to convert them before aggregating.

REQUIRED OUTPUT COLUMNS:
The caller has pinned these columns to appear in the result:
{allowed}

Instructions:
1. You MUST include every required output column in your SELECT clause.
2. You MAY use any other schema column for filtering (WHERE), sorting (ORDER BY), or joining, even if it is not in the required list.
3. Do not add extra columns to the SELECT clause unless the answer needs them.

Question: {question}

Schema: {schema}

Feedback from previous attempt (if any): {feedback}

Respond with a bare JSON object, no markdown:
- To answer: {{"sql": "<the query>"}}
- If a column the answer needs is absent from the schema, do NOT invent it; respond: {{"error": true, "missing_columns": ["<column>", ...]}}
"#,
        allowed = input.allowed_columns,
        question = input.question,
        schema = input.schema,
        feedback = input.feedback,
    )
}

/// Prompt for the SQL review (validation) role.
pub fn sql_review(sql: &str, schema: &str) -> String {
    format!(
        r#"You are a SQL validator. Given a SQLite query and a database schema, decide whether the query is valid and follows best practices.

Schema: {schema}

Query: {sql}

Check for:
1. Syntax errors.
2. SQLite date handling: dates are stored as TEXT (e.g. "21-Aug-2023"). EXTRACT, DATE_PART, and MONTH() do not exist in SQLite. Filter dates with case-insensitive string matching, e.g. LOWER(Date) LIKE '%21-aug%'.
3. String matching: prefer LOWER(column) LIKE '%value%' over exact = unless the casing is certain.
4. Casting: a TEXT column holding numbers (e.g. "1,200.00") needs CAST(REPLACE(col, ',', '') AS REAL) before arithmetic.
5. Table and column existence in the schema.
6. Proper join conditions.
7. Logical correctness.

Respond with a bare JSON object, no markdown:
{{"valid": <boolean>, "reasoning": "<why the query is valid or invalid>"}}
"#
    )
}

/// Prompt for the relevance pre-check role.
pub fn relevance_check(question: &str, schema: &str) -> String {
    format!(
        r#"You are a database expert. Decide whether this natural language question can be answered using ONLY the provided schema.

Schema:
{schema}

Question:
{question}

Consider:
1. Does the question refer to tables or concepts present in the schema?
2. Can a SQL query over this schema answer it?
3. IMPORTANT: if the question mentions specific values (names, categories, types like "Bill" or "Salary") that are not in the schema, ASSUME they are values inside a column and answer relevant: true.

Only answer relevant: false when the question is completely unrelated to the schema (e.g. asking about weather when the schema is about users). If you are unsure, ALWAYS answer relevant: true and let the generator attempt a query.

Respond with a bare JSON object, no markdown:
{{"relevant": <boolean>, "reasoning": "<explanation>"}}
"#
    )
}

/// Prompt for the title role.
pub fn title(question: &str) -> String {
    format!(
        "Summarize the following SQL question into a short, clean, human-readable \
         title (3-6 words). Ignore technical context or data dumps. Return ONLY the \
         title text. Question: \"{}\"",
        question
    )
}

/// Prompt for the table naming role.
pub fn table_name(filename: &str, headers: &[String]) -> String {
    let preview: Vec<&str> = headers.iter().take(5).map(String::as_str).collect();
    format!(
        "Given the filename \"{}\" and headers \"{}...\", generate a concise \
         snake_case table name (max 50 chars). Do not use a 'table_' prefix unless \
         necessary. Return ONLY the name.",
        filename,
        preview.join(", ")
    )
}

/// Prompt for the cleanup-proposal role.
pub fn cleanup(table: &str, columns: &[String], sample_json: &str) -> String {
    format!(
        r#"I have a SQLite table named "{table}" with columns: {columns}.
Here are sample rows:
{sample}

Generate a SQL script to CLEAN this data. Focus on:
1. Trimming whitespace from text columns.
2. Converting empty strings '' to NULL where appropriate.
3. Standardizing dates: if you see values like '01/01/2023', convert them to 'YYYY-MM-DD'.
4. Fixing obvious typos in categorical columns if evident.

Return ONLY the raw SQL UPDATE statements, separated by semicolons. No markdown, no explanation.
"#,
        table = table,
        columns = columns.join(", "),
        sample = sample_json,
    )
}

/// Prompt for the table-analysis role.
pub fn table_analysis(contexts: &[TableContext]) -> String {
    let mut data = String::new();
    for ctx in contexts {
        data.push_str(&format!(
            "\n=== TABLE: {} ===\nColumns: {}\nSample data:\n{}\n",
            ctx.table,
            serde_json::to_string(&ctx.columns).unwrap_or_default(),
            serde_json::to_string(&ctx.rows).unwrap_or_default(),
        ));
    }
    let cross_table = if contexts.len() > 1 {
        "Since there are multiple tables, you MUST identify potential relationships \
         (foreign keys), join opportunities, or correlations BETWEEN them.\n"
    } else {
        ""
    };
    format!(
        r#"Act as a senior data analyst. Analyze the following database table(s).
{data}
{cross_table}
Respond with a bare JSON object, no markdown:
{{"summary": "<2-3 sentence overview>", "trends": ["<trend>", ...], "anomalies": ["<anomaly>", ...], "questions": ["<suggested question>", ...]}}
"#,
        data = data,
        cross_table = cross_table,
    )
}

// =============================================================================
// TESTS
// =============================================================================
