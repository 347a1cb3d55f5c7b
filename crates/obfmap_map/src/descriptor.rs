//! Class-name rewriting inside field/method descriptors and generic signatures.

/// Rewrites every class name referenced by `signature` through `map_class`.
///
/// Accepts plain descriptors (`(ILjava/lang/String;)V`) as well as generic
/// signatures with formal type parameters, type arguments, type variables and
/// inner-class suffixes. An inner-class suffix (`LOuter<..>.Inner;`) is mapped
/// as `Outer$Inner` and written as the part after the mapped outer name and
/// `$`, or after the last `$` when the mapped inner name does not extend the
/// mapped outer one. Type variable names are copied unchanged.
pub fn remap_signature<F>(signature: &str, mut map_class: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut scanner = SignatureScanner {
        input: signature,
        pos: 0,
        out: String::with_capacity(signature.len()),
    };

    if scanner.peek() == Some('<') {
        scanner.formal_type_parameters(&mut map_class);
    }
    while scanner.pos < scanner.input.len() {
        scanner.element(&mut map_class);
    }
    scanner.out
}

/// Returns the parameter portion `(...)` of a method descriptor, or the whole
/// descriptor when it has no closing parenthesis.
pub fn method_parameters(descriptor: &str) -> &str {
    match descriptor.rfind(')') {
        Some(end) => &descriptor[..=end],
        None => descriptor,
    }
}

struct SignatureScanner<'a> {
    input: &'a str,
    pos: usize,
    out: String,
}

impl<'a> SignatureScanner<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        self.out.push(ch);
        Some(ch)
    }

    /// Consumes up to (not including) the first char in `stops`.
    fn take_until(&mut self, stops: &[char]) -> &'a str {
        let rest = &self.input[self.pos..];
        let end = rest.find(|ch| stops.contains(&ch)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn formal_type_parameters<F>(&mut self, map_class: &mut F)
    where
        F: FnMut(&str) -> String,
    {
        self.bump(); // '<'
        while let Some(ch) = self.peek() {
            if ch == '>' {
                self.bump();
                return;
            }
            let identifier = self.take_until(&[':', '>']);
            self.out.push_str(identifier);
            // class bound and interface bounds, each introduced by ':'
            while self.peek() == Some(':') {
                self.bump();
                if matches!(self.peek(), Some('L' | 'T' | '[')) {
                    self.element(map_class);
                }
            }
        }
    }

    fn element<F>(&mut self, map_class: &mut F)
    where
        F: FnMut(&str) -> String,
    {
        match self.peek() {
            Some('L') => self.class_type(map_class),
            Some('T') => {
                let variable = self.take_until(&[';']);
                self.out.push_str(variable);
                self.bump();
            }
            Some(_) => {
                self.bump();
            }
            None => {}
        }
    }

    fn class_type<F>(&mut self, map_class: &mut F)
    where
        F: FnMut(&str) -> String,
    {
        self.bump(); // 'L'
        let name = self.take_until(&[';', '<', '.']);
        let mut original = name.to_string();
        let mut mapped = map_class(name);
        self.out.push_str(&mapped);
        loop {
            match self.peek() {
                Some('<') => {
                    self.bump();
                    while let Some(ch) = self.peek() {
                        if ch == '>' {
                            self.bump();
                            break;
                        }
                        self.element(map_class);
                    }
                }
                Some('.') => {
                    self.bump();
                    let inner = self.take_until(&[';', '<', '.']);
                    let outer_prefix = format!("{mapped}$");
                    original = format!("{original}${inner}");
                    mapped = map_class(&original);
                    let simple = match mapped.strip_prefix(outer_prefix.as_str()) {
                        Some(simple) => simple,
                        None => mapped.rfind('$').map_or(mapped.as_str(), |dollar| &mapped[dollar + 1..]),
                    };
                    self.out.push_str(simple);
                }
                Some(';') => {
                    self.bump();
                    return;
                }
                _ => return,
            }
        }
    }
}
