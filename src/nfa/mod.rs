/*!
Non-deterministic finite automata.
*/

pub mod thompson;
