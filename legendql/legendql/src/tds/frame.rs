use std::fmt::Debug;
use std::sync::Arc;

use legendql_sql::ast::QuerySpecification;
use legendql_sql::DialectExtension;

use super::functions::*;
use super::TdsColumn;
use crate::language::{Primitive, SortInfo, TdsRow, Window};
use crate::{Error, FrameToPureConfig, FrameToSqlConfig, Result, WithErrorInfo};

const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Runs PURE queries on behalf of frames.
///
/// The library never talks to an execution engine itself; hosts install an
/// implementation with [TdsFrame::with_execution_service].
pub trait ExecutionService: Debug + Send + Sync {
    /// Executes `query` and hands the raw response to `sink`, at most
    /// `chunk_size` bytes at a time.
    fn execute(
        &self,
        query: &str,
        chunk_size: usize,
        sink: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<()>;
}

/// An immutable tabular frame.
///
/// A frame is either a source (see [TdsFrame::table]) or the result of
/// applying a transformation to other frames. Transformations validate their
/// arguments and evaluate their closures when they are applied, so a frame
/// that exists always renders. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct TdsFrame {
    columns: Arc<[TdsColumn]>,
    function: Arc<dyn AppliedFunction>,
    execution_service: Option<Arc<dyn ExecutionService>>,
}

impl TdsFrame {
    /// A frame reading all `columns` of the table named by `parts`
    /// (`["db", "schema", "table"]`).
    pub fn table<I, S>(parts: I, columns: Vec<TdsColumn>) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts = parts.into_iter().map(Into::into).collect();
        let source = TableSourceFunction::new(parts, &columns)?;
        Ok(TdsFrame {
            columns: columns.into(),
            function: Arc::new(source),
            execution_service: None,
        })
    }

    pub(crate) fn applied<F>(base: &TdsFrame, columns: Vec<TdsColumn>, function: F) -> TdsFrame
    where
        F: AppliedFunction + 'static,
    {
        log::trace!("applying {} to a frame of {} columns", function.name(), base.columns.len());
        TdsFrame {
            columns: columns.into(),
            function: Arc::new(function),
            execution_service: base.execution_service.clone(),
        }
    }

    pub fn columns(&self) -> &[TdsColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(TdsColumn::name).collect()
    }

    /// The frame this one was derived from; `None` for source frames.
    pub fn base_frame(&self) -> Option<&TdsFrame> {
        self.function.base_frame()
    }

    /// Frames read besides the base frame, such as the right side of a join.
    pub fn tds_frame_parameters(&self) -> Vec<&TdsFrame> {
        self.function.tds_frame_parameters()
    }

    pub(crate) fn row(&self, frame: &'static str) -> TdsRow<'_> {
        TdsRow::new(frame, &self.columns)
    }

    // emitters

    pub(crate) fn sql_query(&self, extension: &dyn DialectExtension) -> Result<QuerySpecification> {
        log::trace!("translating {} to sql", self.function.name());
        self.function.to_sql(extension)
    }

    pub(crate) fn pure_query(&self, config: &FrameToPureConfig) -> String {
        self.function.to_pure(config)
    }

    /// The SQL metamodel of this frame, for the database type of `config`.
    pub fn to_sql_query_object(&self, config: &FrameToSqlConfig) -> Result<QuerySpecification> {
        let generator = config.sql_to_string_generator()?;
        self.sql_query(generator.db_extension())
    }

    pub fn to_sql_query(&self, config: &FrameToSqlConfig) -> Result<String> {
        let generator = config.sql_to_string_generator()?;
        let query = self.sql_query(generator.db_extension())?;
        generator.generate_sql_string(&query, &config.sql_to_string_config())
    }

    pub fn to_pure_query(&self, config: &FrameToPureConfig) -> String {
        self.pure_query(config)
    }

    // execution

    pub fn with_execution_service(&self, service: Arc<dyn ExecutionService>) -> TdsFrame {
        TdsFrame {
            execution_service: Some(service),
            ..self.clone()
        }
    }

    /// Executes the PURE form of this frame, streaming the raw result to
    /// `handler`.
    pub fn execute_frame<F>(&self, mut handler: F, chunk_size: Option<usize>) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let service = self.execution_service.as_ref().ok_or_else(|| {
            Error::unsupported("Executing a frame requires an execution service")
                .push_hint("install one with `TdsFrame::with_execution_service`")
        })?;

        let query = self.to_pure_query(&FrameToPureConfig::default().no_pretty());
        log::debug!("executing frame: {query}");
        service.execute(&query, chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE), &mut handler)
    }

    pub fn execute_frame_to_string(&self, chunk_size: Option<usize>) -> Result<String> {
        let mut bytes = Vec::new();
        self.execute_frame(
            |chunk| {
                bytes.extend_from_slice(chunk);
                Ok(())
            },
            chunk_size,
        )?;
        String::from_utf8(bytes)
            .map_err(|e| Error::validation(format!("Execution result is not valid UTF-8: {e}")))
    }

    // transformations

    /// Keeps the rows for which `condition` holds.
    pub fn filter<F>(&self, condition: F) -> Result<TdsFrame>
    where
        F: FnOnce(&TdsRow) -> Result<Primitive>,
    {
        FilterFunction::apply(self, condition)
    }

    /// Keeps `columns`, in the order given.
    pub fn select<I, S>(&self, columns: I) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectFunction::apply(self, collect_names(columns))
    }

    pub fn distinct(&self) -> Result<TdsFrame> {
        DistinctFunction::apply(self, None)
    }

    /// Distinct values of `columns`.
    pub fn distinct_by<I, S>(&self, columns: I) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DistinctFunction::apply(self, Some(collect_names(columns)))
    }

    /// Appends computed columns.
    pub fn extend<'f, I>(&self, columns: I) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = NewColumn<'f>>,
    {
        ExtendFunction::apply(self, columns.into_iter().collect())
    }

    /// Replaces the columns with computed ones.
    pub fn project<'f, I>(&self, columns: I) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = NewColumn<'f>>,
    {
        ProjectFunction::apply(self, columns.into_iter().collect())
    }

    /// Renames columns given as `(old, new)` pairs.
    pub fn rename<I, A, B>(&self, pairs: I) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect();
        RenameFunction::apply(self, pairs)
    }

    /// Groups by `columns` and computes `aggregates` per group.
    ///
    /// Every aggregate must be built with [NewColumn::aggregated].
    pub fn group_by<'f, I, S, A>(&self, columns: I, aggregates: A) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        A: IntoIterator<Item = NewColumn<'f>>,
    {
        GroupByFunction::apply(
            self,
            collect_names(columns),
            aggregates.into_iter().collect(),
        )
    }

    pub fn sort<I, S>(&self, keys: I) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = S>,
        S: Into<SortInfo>,
    {
        SortFunction::apply(self, keys.into_iter().map(Into::into).collect())
    }

    /// Rows `start` (inclusive) to `end` (exclusive).
    pub fn slice(&self, start: i64, end: i64) -> Result<TdsFrame> {
        SliceFunction::apply(self, start, end)
    }

    /// At most `count` rows.
    pub fn limit(&self, count: i64) -> Result<TdsFrame> {
        LimitFunction::apply(self, count)
    }

    /// Alias of [TdsFrame::limit].
    pub fn head(&self, count: i64) -> Result<TdsFrame> {
        self.limit(count)
    }

    /// Skips the first `count` rows.
    pub fn drop(&self, count: i64) -> Result<TdsFrame> {
        DropFunction::apply(self, count)
    }

    /// Joins with `other` on `condition`, evaluated over a left (`l`) and a
    /// right (`r`) row.
    pub fn join<F>(&self, other: &TdsFrame, condition: F, kind: JoinKind) -> Result<TdsFrame>
    where
        F: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
    {
        JoinFunction::apply(self, other, condition, kind)
    }

    /// As-of join: each left row is matched with the closest right row for
    /// which `matcher` holds. Only renders to PURE.
    pub fn as_of_join<M>(&self, other: &TdsFrame, matcher: M) -> Result<TdsFrame>
    where
        M: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
    {
        AsOfJoinFunction::apply(self, other, matcher, None::<fn(&TdsRow, &TdsRow) -> Result<Primitive>>)
    }

    /// [TdsFrame::as_of_join] restricted to row pairs satisfying `condition`.
    pub fn as_of_join_on<M, F>(&self, other: &TdsFrame, matcher: M, condition: F) -> Result<TdsFrame>
    where
        M: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
        F: FnOnce(&TdsRow, &TdsRow) -> Result<Primitive>,
    {
        AsOfJoinFunction::apply(self, other, matcher, Some(condition))
    }

    /// Rows of this frame followed by the rows of `other` (`UNION ALL`).
    pub fn concatenate(&self, other: &TdsFrame) -> Result<TdsFrame> {
        ConcatenateFunction::apply(self, other)
    }

    /// Appends columns computed over `window`.
    pub fn window_extend<'f, I>(&self, window: Window, columns: I) -> Result<TdsFrame>
    where
        I: IntoIterator<Item = WindowColumn<'f>>,
    {
        WindowExtendFunction::apply(self, window, columns.into_iter().collect())
    }
}

fn collect_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use insta::assert_snapshot;

    use super::*;
    use crate::{ErrorKind, PrimitiveType};

    fn frame() -> TdsFrame {
        TdsFrame::table(
            ["db", "schema", "t"],
            vec![
                TdsColumn::new("c1", PrimitiveType::Integer),
                TdsColumn::new("c2", PrimitiveType::String),
            ],
        )
        .unwrap()
    }

    #[derive(Debug, Default)]
    struct Recorder {
        queries: Mutex<Vec<String>>,
    }

    impl ExecutionService for Recorder {
        fn execute(
            &self,
            query: &str,
            chunk_size: usize,
            sink: &mut dyn FnMut(&[u8]) -> Result<()>,
        ) -> Result<()> {
            self.queries.lock().unwrap().push(query.to_string());
            for chunk in b"c1\n1\n2\n".chunks(chunk_size) {
                sink(chunk)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_execute_without_service() {
        let err = frame().execute_frame_to_string(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert_snapshot!(err, @r"
        Executing a frame requires an execution service
        ↳ Hint: install one with `TdsFrame::with_execution_service`
        ");
    }

    #[test]
    fn test_execute_with_service() {
        let recorder = Arc::new(Recorder::default());
        let frame = frame()
            .with_execution_service(recorder.clone())
            .select(["c1"])
            .unwrap();

        let mut chunks = 0;
        frame
            .execute_frame(
                |_| {
                    chunks += 1;
                    Ok(())
                },
                Some(2),
            )
            .unwrap();
        assert_eq!(chunks, 4);
        assert_eq!(frame.execute_frame_to_string(None).unwrap(), "c1\n1\n2\n");
        assert_eq!(
            recorder.queries.lock().unwrap()[0],
            "#Table(db.schema.t)#->select(~[c1])"
        );
    }

    #[test]
    fn test_frames_are_values() {
        let base = frame();
        let filtered = base.filter(|r| r.get("c1")?.gt(1)).unwrap();
        assert_eq!(base.column_names(), filtered.column_names());
        assert_eq!(
            base.to_pure_query(&FrameToPureConfig::default()),
            "#Table(db.schema.t)#"
        );
    }

    #[test]
    fn test_walk_join_graph() {
        let pure = |f: &TdsFrame| f.to_pure_query(&FrameToPureConfig::default().no_pretty());
        let other = TdsFrame::table(
            ["db", "schema", "u"],
            vec![TdsColumn::new("k", PrimitiveType::Integer)],
        )
        .unwrap();
        let filtered = frame().filter(|r| r.get("c1")?.gt(1)).unwrap();
        let joined = filtered
            .join(&other, |l, r| l.get("c1")?.eq(r.get("k")?), JoinKind::Inner)
            .unwrap()
            .select(["c2", "k"])
            .unwrap();

        let join = joined.base_frame().unwrap();
        assert_eq!(join.column_names(), vec!["c1", "c2", "k"]);
        assert_eq!(pure(join.base_frame().unwrap()), pure(&filtered));
        let parameters = join.tds_frame_parameters();
        assert_eq!(parameters.len(), 1);
        assert_eq!(pure(parameters[0]), "#Table(db.schema.u)#");
        assert!(joined.tds_frame_parameters().is_empty());

        let mut depth = 0;
        let mut current = &joined;
        while let Some(base) = current.base_frame() {
            depth += 1;
            current = base;
        }
        assert_eq!(depth, 3);
        assert_eq!(pure(current), "#Table(db.schema.t)#");
        assert!(current.tds_frame_parameters().is_empty());
    }

    #[test]
    fn test_walk_concatenate_graph() {
        let pure = |f: &TdsFrame| f.to_pure_query(&FrameToPureConfig::default().no_pretty());
        let low = frame().filter(|r| r.get("c1")?.lt(0)).unwrap();
        let high = frame().filter(|r| r.get("c1")?.gt(10)).unwrap();
        let both = low.concatenate(&high).unwrap();

        assert_eq!(pure(both.base_frame().unwrap()), pure(&low));
        let parameters = both.tds_frame_parameters();
        assert_eq!(parameters.len(), 1);
        assert_eq!(pure(parameters[0]), pure(&high));
        assert_eq!(
            pure(parameters[0].base_frame().unwrap()),
            "#Table(db.schema.t)#"
        );
    }
}
