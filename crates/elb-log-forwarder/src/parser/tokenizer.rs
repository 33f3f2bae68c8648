// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

const FIELD_SEPARATOR: char = ' ';
const QUOTE_CHAR: char = '"';
const ESCAPE_CHAR: char = '\\';

/// Splits an access-log line into its space separated fields.
///
/// Double quotes group a field that contains spaces and are dropped from the
/// output. A backslash makes the next character literal and is dropped too.
/// A trailing field is only emitted when it is not empty, so a line ending in
/// a separator does not produce an empty last field.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quote = false;
    let mut escape = false;

    for c in line.chars() {
        if !escape {
            match c {
                ESCAPE_CHAR => {
                    escape = true;
                    continue;
                }
                QUOTE_CHAR => {
                    quote = !quote;
                    continue;
                }
                FIELD_SEPARATOR if !quote => {
                    fields.push(std::mem::take(&mut field));
                    continue;
                }
                _ => {}
            }
        }
        field.push(c);
        escape = false;
    }
    if !field.is_empty() {
        fields.push(field);
    }

    fields
}
