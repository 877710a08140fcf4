use super::error::TemplateError;
use std::fmt::{Display, Write};

/// 使用位置参数展开资源路径模版
///
/// 支持 `{}` 顺序占位符与 `{0}` 序号占位符，`{{` 与 `}}` 表示字面量的花括号。
/// 每个参数都必须被至少一个占位符引用
pub(crate) fn expand(template: &str, args: &[&dyn Display]) -> Result<String, TemplateError> {
    let mut expanded = String::with_capacity(template.len());
    let mut next_index = 0usize;
    let mut used = vec![false; args.len()];
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                expanded.push('{');
            }
            '{' => {
                let mut placeholder = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => placeholder.push(c),
                        None => return Err(TemplateError::UnclosedPlaceholder(pos)),
                    }
                }
                let index = if placeholder.is_empty() {
                    next_index += 1;
                    next_index - 1
                } else {
                    placeholder
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| TemplateError::InvalidPlaceholder(placeholder.clone()))?
                };
                let arg = args.get(index).ok_or(TemplateError::MissingArgument {
                    index,
                    count: args.len(),
                })?;
                used[index] = true;
                write!(expanded, "{arg}").ok();
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                expanded.push('}');
            }
            '}' => return Err(TemplateError::UnmatchedBrace(pos)),
            c => expanded.push(c),
        }
    }
    if let Some(index) = used.iter().position(|used| !used) {
        return Err(TemplateError::UnusedArgument {
            index,
            count: args.len(),
        });
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_positional_and_indexed() {
        env_logger::builder().is_test(true).try_init().ok();

        assert_eq!(
            expand("/users/{}/tracks/{}", &[&"bob", &42]).unwrap(),
            "/users/bob/tracks/42"
        );
        assert_eq!(expand("/{1}/{0}/{1}", &[&"a", &"b"]).unwrap(), "/b/a/b");
        assert_eq!(expand("/{{literal}}/{}", &[&1]).unwrap(), "/{literal}/1");
    }

    #[test]
    fn test_expand_errors() {
        env_logger::builder().is_test(true).try_init().ok();

        assert_eq!(
            expand("/tracks/{}", &[]).unwrap_err(),
            TemplateError::MissingArgument { index: 0, count: 0 }
        );
        assert_eq!(
            expand("/tracks/{", &[&1]).unwrap_err(),
            TemplateError::UnclosedPlaceholder(8)
        );
        assert_eq!(expand("/tracks}", &[&1]).unwrap_err(), TemplateError::UnmatchedBrace(7));
        assert_eq!(
            expand("/tracks/{id}", &[&1]).unwrap_err(),
            TemplateError::InvalidPlaceholder("id".to_owned())
        );
    }

    #[test]
    fn test_expand_rejects_unused_arguments() {
        env_logger::builder().is_test(true).try_init().ok();

        assert_eq!(
            expand("/tracks/%d", &[&42]).unwrap_err(),
            TemplateError::UnusedArgument { index: 0, count: 1 }
        );
        assert_eq!(
            expand("/users/{}/tracks", &[&"bob", &10]).unwrap_err(),
            TemplateError::UnusedArgument { index: 1, count: 2 }
        );
        assert_eq!(expand("/{0}/{0}", &[&"a"]).unwrap(), "/a/a");
    }
}
