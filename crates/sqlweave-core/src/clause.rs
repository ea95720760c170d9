//! Clause ordering.
//!
//! A [`ClauseSequencer`] tracks the clause most recently opened in one scope
//! and only lets a clause open when the current one is among its declared
//! predecessors. The predecessor sets below are the single source of truth
//! for "is this SQL well-formed so far".

use std::fmt;

use crate::ast::{JoinKind, SetOp};
use crate::error::{CompileError, Result};
use crate::sink::SqlSink;

/// A clause of a DML/DQL statement, plus the start state and the
/// pseudo-clauses bracketing parenthesized set-operation operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    /// Nothing opened yet.
    Start,
    /// SELECT
    Select,
    /// FROM
    From,
    /// Any JOIN
    Join(JoinKind),
    /// ON
    On,
    /// WHERE
    Where,
    /// GROUP BY
    GroupBy,
    /// HAVING
    Having,
    /// ORDER BY
    OrderBy,
    /// LIMIT
    Limit,
    /// OFFSET
    Offset,
    /// FOR UPDATE
    ForUpdate,
    /// FOR SHARE
    ForShare,
    /// UNION / INTERSECT / EXCEPT
    SetOperation(SetOp),
    /// Opening of a parenthesized operand.
    LeftParen,
    /// Closing of a parenthesized operand.
    RightParen,
    /// INSERT INTO
    InsertInto,
    /// VALUES
    Values,
    /// ON CONFLICT
    Conflict,
    /// ON DUPLICATE KEY UPDATE
    DuplicateKeyUpdate,
    /// UPDATE
    Update,
    /// SET
    Set,
    /// DELETE FROM
    DeleteFrom,
    /// RETURNING
    Returning,
}

/// Discriminant-only view of [`Clause`], used in predecessor tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Start,
    Select,
    From,
    Join,
    On,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
    Lock,
    SetOperation,
    LeftParen,
    RightParen,
    InsertInto,
    Values,
    Conflict,
    DuplicateKeyUpdate,
    Update,
    Set,
    DeleteFrom,
    Returning,
}

/// Clauses after which a query may end.
const QUERY_END: &[Tag] = &[
    Tag::Select,
    Tag::From,
    Tag::Join,
    Tag::On,
    Tag::Where,
    Tag::GroupBy,
    Tag::Having,
    Tag::OrderBy,
    Tag::Limit,
    Tag::Offset,
    Tag::Lock,
    Tag::Values,
    Tag::RightParen,
];

const ORDER_BY_AFTER: &[Tag] = &[
    Tag::Select,
    Tag::From,
    Tag::Join,
    Tag::On,
    Tag::Where,
    Tag::GroupBy,
    Tag::Having,
    Tag::RightParen,
    Tag::Values,
    Tag::Set,
    Tag::DeleteFrom,
];

const LIMIT_AFTER: &[Tag] = &[
    Tag::Select,
    Tag::From,
    Tag::Join,
    Tag::On,
    Tag::Where,
    Tag::GroupBy,
    Tag::Having,
    Tag::RightParen,
    Tag::Values,
    Tag::Set,
    Tag::DeleteFrom,
    Tag::OrderBy,
];

const OFFSET_AFTER: &[Tag] = &[
    Tag::Select,
    Tag::From,
    Tag::Join,
    Tag::On,
    Tag::Where,
    Tag::GroupBy,
    Tag::Having,
    Tag::RightParen,
    Tag::Values,
    Tag::OrderBy,
    Tag::Limit,
];

impl Clause {
    const fn tag(self) -> Tag {
        match self {
            Self::Start => Tag::Start,
            Self::Select => Tag::Select,
            Self::From => Tag::From,
            Self::Join(_) => Tag::Join,
            Self::On => Tag::On,
            Self::Where => Tag::Where,
            Self::GroupBy => Tag::GroupBy,
            Self::Having => Tag::Having,
            Self::OrderBy => Tag::OrderBy,
            Self::Limit => Tag::Limit,
            Self::Offset => Tag::Offset,
            Self::ForUpdate | Self::ForShare => Tag::Lock,
            Self::SetOperation(_) => Tag::SetOperation,
            Self::LeftParen => Tag::LeftParen,
            Self::RightParen => Tag::RightParen,
            Self::InsertInto => Tag::InsertInto,
            Self::Values => Tag::Values,
            Self::Conflict => Tag::Conflict,
            Self::DuplicateKeyUpdate => Tag::DuplicateKeyUpdate,
            Self::Update => Tag::Update,
            Self::Set => Tag::Set,
            Self::DeleteFrom => Tag::DeleteFrom,
            Self::Returning => Tag::Returning,
        }
    }

    /// The clauses this clause may directly follow.
    const fn predecessors(self) -> &'static [Tag] {
        match self.tag() {
            Tag::Start => &[],
            Tag::Select => &[Tag::Start, Tag::LeftParen],
            Tag::From => &[Tag::Select, Tag::Set],
            Tag::Join => &[Tag::From, Tag::Join, Tag::On, Tag::Update],
            Tag::On => &[Tag::Join],
            Tag::Where => &[Tag::From, Tag::Join, Tag::On, Tag::Set, Tag::DeleteFrom],
            Tag::GroupBy => &[Tag::From, Tag::Join, Tag::On, Tag::Where],
            Tag::Having => &[Tag::GroupBy],
            Tag::OrderBy => ORDER_BY_AFTER,
            Tag::Limit => LIMIT_AFTER,
            Tag::Offset => OFFSET_AFTER,
            Tag::Lock => &[
                Tag::Select,
                Tag::From,
                Tag::Join,
                Tag::On,
                Tag::Where,
                Tag::OrderBy,
                Tag::Limit,
                Tag::Offset,
            ],
            Tag::SetOperation => &[
                Tag::RightParen,
                Tag::Select,
                Tag::From,
                Tag::Join,
                Tag::On,
                Tag::Where,
                Tag::GroupBy,
                Tag::Having,
                Tag::Values,
            ],
            Tag::LeftParen => &[Tag::Start, Tag::SetOperation, Tag::LeftParen],
            Tag::RightParen => QUERY_END,
            Tag::InsertInto | Tag::Update | Tag::DeleteFrom => &[Tag::Start],
            Tag::Values => &[Tag::Start, Tag::InsertInto, Tag::LeftParen],
            Tag::Conflict => &[Tag::Values, Tag::InsertInto],
            Tag::DuplicateKeyUpdate => &[Tag::Values],
            Tag::Set => &[Tag::Update, Tag::Join, Tag::On, Tag::Conflict],
            Tag::Returning => &[
                Tag::Values,
                Tag::InsertInto,
                Tag::Conflict,
                Tag::DuplicateKeyUpdate,
                Tag::Set,
                Tag::From,
                Tag::Join,
                Tag::On,
                Tag::Where,
                Tag::DeleteFrom,
            ],
        }
    }

    /// The keyword text written when the clause opens.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Start => "",
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Join(kind) => kind.as_str(),
            Self::On => "ON",
            Self::Where => "WHERE",
            Self::GroupBy => "GROUP BY",
            Self::Having => "HAVING",
            Self::OrderBy => "ORDER BY",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::ForUpdate => "FOR UPDATE",
            Self::ForShare => "FOR SHARE",
            Self::SetOperation(op) => op.as_str(),
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::InsertInto => "INSERT INTO",
            Self::Values => "VALUES",
            Self::Conflict => "ON CONFLICT",
            Self::DuplicateKeyUpdate => "ON DUPLICATE KEY UPDATE",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::DeleteFrom => "DELETE FROM",
            Self::Returning => "RETURNING",
        }
    }

    /// Returns true when `self` may directly follow `previous`.
    #[must_use]
    pub fn may_follow(self, previous: Self) -> bool {
        self.predecessors().contains(&previous.tag())
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("<start>"),
            Self::LeftParen => f.write_str("<open operand>"),
            Self::RightParen => f.write_str("<close operand>"),
            other => f.write_str(other.keyword()),
        }
    }
}

/// Finite-state machine over the clauses of one scope.
#[derive(Debug, Clone)]
pub struct ClauseSequencer {
    state: Clause,
}

impl ClauseSequencer {
    /// Creates a sequencer in the start state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Clause::Start,
        }
    }

    /// Creates a sequencer continuing from `state`.
    ///
    /// Used for the operand of a set operation, which is compiled in its own
    /// scope but continues the clause sequence of the enclosing one.
    #[must_use]
    pub const fn resume(state: Clause) -> Self {
        Self { state }
    }

    /// The clause most recently opened.
    #[must_use]
    pub const fn state(&self) -> Clause {
        self.state
    }

    /// Moves to `clause` without writing anything.
    pub fn transition(&mut self, clause: Clause) -> Result<()> {
        if !clause.may_follow(self.state) {
            return Err(CompileError::StatementStructure {
                from: self.state,
                to: clause,
            });
        }
        self.state = clause;
        Ok(())
    }

    /// Opens `clause` and writes its keyword.
    ///
    /// The operand brackets write `(` and `)`; a dialect without
    /// parenthesized operands moves through them with [`Self::transition`].
    pub fn enter(&mut self, clause: Clause, sink: &mut SqlSink) -> Result<()> {
        self.transition(clause)?;
        match clause {
            Clause::LeftParen => sink.open_paren(),
            Clause::RightParen => sink.close_paren(),
            other => sink.keyword(other.keyword()),
        }
        Ok(())
    }
}

impl Default for ClauseSequencer {
    fn default() -> Self {
        Self::new()
    }
}
