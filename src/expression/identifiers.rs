use itertools::Itertools;

use crate::expression::{
    lexer::{tokenize, Token},
    Vocabulary,
};

/// Distinct band identifiers of `expression`, in order of first occurrence.
///
/// Every word outside `vocabulary` is an identifier, numbers are not.
/// The expression is not validated.
pub fn identifiers(expression: &str, vocabulary: &Vocabulary) -> Vec<String> {
    tokenize(expression)
        .into_iter()
        .filter_map(|(_, token)| match token {
            Token::Word(word) if !vocabulary.is_reserved(word) => Some(word),
            _ => None,
        })
        .unique()
        .map(String::from)
        .collect()
}
