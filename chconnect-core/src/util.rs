pub fn consume_while<'s>(input: &mut &'s str, predicate: impl FnMut(&char) -> bool) -> &'s str {
    let len = input
        .chars()
        .take_while(predicate)
        .map(char::len_utf8)
        .sum::<usize>();
    if len == 0 {
        return "";
    }
    let result = &input[..len];
    *input = &input[len..];
    result
}

pub fn skip_whitespace(input: &mut &str) {
    *input = input.trim_start();
}

/// Replace every newline with a space, statements are sent on a single line.
pub fn flatten_lines(query: &str) -> String {
    query.replace('\n', " ")
}

/// Longest prefix of `value` not exceeding `len` bytes that ends on a char boundary.
pub fn truncate_at(value: &str, len: usize) -> &str {
    if value.len() <= len {
        return value;
    }
    let mut end = len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncate_at(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Build [`Parameters`](crate::Parameters) from `name => value` pairs.
///
/// ```rust
/// let parameters = chconnect_core::parameters! { "id" => 42, "name" => "alpha" };
/// assert_eq!(parameters.len(), 2);
/// ```
#[macro_export]
macro_rules! parameters {
    ($($name:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut parameters = $crate::Parameters::new();
        $(parameters.insert(::std::string::String::from($name), $crate::Value::from($value));)*
        parameters
    }};
}
