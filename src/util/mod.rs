/*!
Types and routines shared by every engine.

Most of what lives here is plumbing: byte sets and byte classes, identifier
types, match and capture types, and the iteration routine that turns a
"find the next match" function into a `findall` style list of matches. The
[`prefilter`] and [`literal`] modules provide the literal scanning that the
router uses to skip over text that can't match.
*/

pub mod alphabet;
pub mod captures;
pub mod iter;
pub mod literal;
pub mod look;
pub mod prefilter;
pub mod primitives;
pub mod search;

pub(crate) mod fnv;
pub(crate) mod pool;
pub(crate) mod sparse_set;
