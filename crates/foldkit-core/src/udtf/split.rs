use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use regex::Regex;

use crate::{
    error::{Error, Result},
    registry::Description,
    types::{DataType, Field, Value},
    udtf::{Rows, TableFunction},
};

const SPLIT_EXPLODE: Description = Description {
    name: "split_explode_udtf",
    value: "_FUNC_(data,delimiter)",
    extended: Some(
        "Example:\n  > SELECT name, str FROM table \
         LATERAL VIEW _FUNC_(data,delimiter) temp_table AS str;",
    ),
};

/// Upper bound of compiled delimiters kept around per function instance
const PATTERN_CACHE_LIMIT: usize = 64;

/// `split_explode_udtf`: splits a string on a regex delimiter, one output row per piece
#[derive(Debug, Default)]
pub struct SplitExplode {
    patterns: Mutex<HashMap<String, Arc<Regex>>>,
}

impl SplitExplode {
    /// Creates a new function instance with an empty pattern cache
    pub fn new() -> Self {
        Self::default()
    }

    fn pattern(&self, delimiter: &str) -> Result<Arc<Regex>> {
        let mut patterns = self.patterns.lock();
        if let Some(regex) = patterns.get(delimiter) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(delimiter).map_err(|source| {
            log::warn!(
                "{}: cannot compile delimiter {delimiter:?}",
                SPLIT_EXPLODE.name
            );
            Error::InvalidPattern {
                pattern: delimiter.to_string(),
                source,
            }
        })?;
        if patterns.len() >= PATTERN_CACHE_LIMIT {
            patterns.clear();
        }
        let regex = Arc::new(regex);
        patterns.insert(delimiter.to_string(), regex.clone());
        Ok(regex)
    }

    /// Splits `haystack` on `delimiter`, returning the pieces lazily
    pub fn split<'h>(&self, haystack: &'h str, delimiter: &str) -> Result<SplitPieces<'h>> {
        Ok(SplitPieces::new(self.pattern(delimiter)?, haystack))
    }
}

impl TableFunction for SplitExplode {
    fn description(&self) -> &Description {
        &SPLIT_EXPLODE
    }

    fn initialize(&self, arguments: &[DataType]) -> Result<Vec<Field>> {
        if arguments.len() != 2 {
            return Err(Error::ArgumentCount {
                function: SPLIT_EXPLODE.name,
                expected: "exactly 2",
                actual: arguments.len(),
            });
        }
        for (position, argument) in arguments.iter().enumerate() {
            if *argument != DataType::String {
                return Err(Error::ArgumentType {
                    function: SPLIT_EXPLODE.name,
                    position,
                    actual: argument.clone(),
                    message: "only string arguments are accepted",
                });
            }
        }
        Ok(vec![Field::new("col", DataType::String)])
    }

    fn process<'a>(&self, arguments: &'a [Value]) -> Result<Rows<'a>> {
        let [data, delimiter] = arguments else {
            return Err(Error::ArgumentCount {
                function: SPLIT_EXPLODE.name,
                expected: "exactly 2",
                actual: arguments.len(),
            });
        };
        let (data, delimiter) = match (data, delimiter) {
            (Value::String(data), Value::String(delimiter)) => (data, delimiter),
            (Value::Null, _) | (_, Value::Null) => return Ok(Box::new(core::iter::empty())),
            (Value::String(_), other) | (other, _) => {
                return Err(Error::coercion(other, "string"));
            }
        };
        let pieces = self.split(data, delimiter)?;
        Ok(Box::new(
            pieces.map(|piece| vec![Value::String(piece.to_string())]),
        ))
    }
}

/// Raw pieces between delimiter matches, before trailing empty pieces are dropped
#[derive(Debug)]
struct Pieces<'h> {
    regex: Arc<Regex>,
    haystack: &'h str,
    /// Offset the next search starts at
    search_at: usize,
    /// Start of the piece currently being delimited
    piece_start: usize,
    matched: bool,
    finished: bool,
}

impl<'h> Pieces<'h> {
    fn next_match(&mut self) -> Option<(usize, usize)> {
        if self.search_at > self.haystack.len() {
            return None;
        }
        let m = self.regex.find_at(self.haystack, self.search_at)?;
        self.search_at = if m.start() == m.end() {
            // step past an empty match so the search makes progress
            self.haystack[m.end()..]
                .chars()
                .next()
                .map_or(self.haystack.len() + 1, |c| m.end() + c.len_utf8())
        } else {
            m.end()
        };
        Some((m.start(), m.end()))
    }
}

impl<'h> Iterator for Pieces<'h> {
    type Item = &'h str;

    fn next(&mut self) -> Option<&'h str> {
        if self.finished {
            return None;
        }
        while let Some((start, end)) = self.next_match() {
            // a zero-width match at the very beginning never yields a leading empty piece
            if self.piece_start == 0 && start == 0 && end == 0 {
                continue;
            }
            let piece = &self.haystack[self.piece_start..start];
            self.piece_start = end;
            self.matched = true;
            return Some(piece);
        }
        self.finished = true;
        Some(&self.haystack[self.piece_start..])
    }
}

/// Lazy sequence of substrings produced by splitting on a delimiter pattern.
///
/// Interior empty pieces are kept while trailing ones are dropped. An input the pattern
/// never splits is returned whole, even when empty.
#[derive(Debug)]
pub struct SplitPieces<'h> {
    pieces: Pieces<'h>,
    /// Empty pieces seen but not yet emitted
    pending_empty: usize,
    /// Non-empty piece waiting for the pending empty pieces ahead of it
    held: Option<&'h str>,
}

impl<'h> SplitPieces<'h> {
    fn new(regex: Arc<Regex>, haystack: &'h str) -> Self {
        Self {
            pieces: Pieces {
                regex,
                haystack,
                search_at: 0,
                piece_start: 0,
                matched: false,
                finished: false,
            },
            pending_empty: 0,
            held: None,
        }
    }
}

impl<'h> Iterator for SplitPieces<'h> {
    type Item = &'h str;

    fn next(&mut self) -> Option<&'h str> {
        if self.held.is_some() && self.pending_empty > 0 {
            self.pending_empty -= 1;
            return Some("");
        }
        if let Some(piece) = self.held.take() {
            return Some(piece);
        }
        loop {
            let piece = self.pieces.next()?;
            if !piece.is_empty() {
                if self.pending_empty == 0 {
                    return Some(piece);
                }
                self.held = Some(piece);
                self.pending_empty -= 1;
                return Some("");
            }
            if !self.pieces.matched {
                // unsplit input is returned as is
                return Some(piece);
            }
            self.pending_empty += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(data: &str, delimiter: &str) -> Vec<String> {
        SplitExplode::new()
            .split(data, delimiter)
            .unwrap()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn split_semantics() {
        assert_eq!(split("a,b,,c", ","), ["a", "b", "", "c"]);
        assert_eq!(split("a,b,,", ","), ["a", "b"]);
        assert_eq!(split(",a", ","), ["", "a"]);
        assert_eq!(split("abc", ","), ["abc"]);
        assert_eq!(split("", ","), [""]);
        assert_eq!(split(",,,", ","), Vec::<String>::new());
        assert_eq!(split("a1b22c", "[0-9]+"), ["a", "b", "c"]);
        assert_eq!(split("a.b", "."), Vec::<String>::new());
        assert_eq!(split("a.b", "\\."), ["a", "b"]);
    }

    #[test]
    fn zero_width_delimiter() {
        assert_eq!(split("abc", ""), ["a", "b", "c"]);
        assert_eq!(split("héllo", ""), ["h", "é", "l", "l", "o"]);
    }

    #[test]
    fn initialize_validates_arguments() {
        let f = SplitExplode::new();
        let schema = f.initialize(&[DataType::String, DataType::String]).unwrap();
        assert_eq!(schema, vec![Field::new("col", DataType::String)]);
        assert!(matches!(
            f.initialize(&[DataType::String]),
            Err(Error::ArgumentCount { actual: 1, .. })
        ));
        assert!(matches!(
            f.initialize(&[DataType::String, DataType::Int]),
            Err(Error::ArgumentType { position: 1, .. })
        ));
    }

    #[test]
    fn process_rows() {
        let f = SplitExplode::new();
        let args = [Value::String("x|y".into()), Value::String("\\|".into())];
        let rows = f.process(&args).unwrap().collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                vec![Value::String("x".into())],
                vec![Value::String("y".into())]
            ]
        );

        let args = [Value::Null, Value::String(",".into())];
        assert_eq!(f.process(&args).unwrap().count(), 0);
        let args = [Value::String("a".into()), Value::Null];
        assert_eq!(f.process(&args).unwrap().count(), 0);

        let args = [Value::String("a".into()), Value::String("(".into())];
        assert!(matches!(
            f.process(&args).map(|_| ()),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn iterator_is_restartable_per_call() {
        let f = SplitExplode::new();
        let args = [Value::String("1,2".into()), Value::String(",".into())];
        let mut first = f.process(&args).unwrap();
        let row = vec![Value::String("1".into())];
        assert_eq!(first.next(), Some(row));
        assert_eq!(f.process(&args).unwrap().count(), 2);
        assert_eq!(first.count(), 1);
    }
}
