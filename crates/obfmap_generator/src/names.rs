use crate::error::GenerateError;
use obfmap_map::Category;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Alphabet of generated type names.
pub const TYPE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Alphabet of generated field, method and dynamic call names.
pub const MEMBER_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

const UNICODE_FIRST: u32 = 0x4E00;
const UNICODE_ALPHABET_LEN: u32 = 4096;

/// Characters with a meaning in internal names, descriptors or map files.
const RESERVED: [char; 9] = ['.', ';', '[', '/', '<', '>', '#', ':', '*'];

/// Produces the name that follows `previous`, or the first name when there is
/// no previous one.
pub trait NameGenerator: Send + Sync + fmt::Debug {
    fn generate(&self, previous: Option<&str>) -> String;
}

/// Counts through every name over a fixed ordered alphabet: `A, B, .., Z, AA,
/// AB, ..` for the type alphabet.
#[derive(Clone)]
pub struct SequentialNameGenerator {
    alphabet: Vec<char>,
    positions: HashMap<char, usize>,
}

impl fmt::Debug for SequentialNameGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.alphabet.iter().take(8).collect();
        f.debug_struct("SequentialNameGenerator")
            .field("alphabet", &preview)
            .field("len", &self.alphabet.len())
            .finish()
    }
}

impl SequentialNameGenerator {
    /// Generator over `alphabet`. The alphabet must be non-empty, free of
    /// duplicates, whitespace and characters reserved by the class file
    /// format.
    pub fn new(alphabet: &str) -> Result<Self, GenerateError> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(GenerateError::InvalidAlphabet {
                reason: "alphabet is empty",
            });
        }
        if alphabet.iter().any(|ch| ch.is_whitespace()) {
            return Err(GenerateError::InvalidAlphabet {
                reason: "alphabet contains whitespace",
            });
        }
        if alphabet.iter().any(|ch| RESERVED.contains(ch)) {
            return Err(GenerateError::InvalidAlphabet {
                reason: "alphabet contains a reserved character",
            });
        }

        let mut positions = HashMap::with_capacity(alphabet.len());
        for (position, ch) in alphabet.iter().enumerate() {
            if positions.insert(*ch, position).is_some() {
                return Err(GenerateError::InvalidAlphabet {
                    reason: "alphabet contains duplicate characters",
                });
            }
        }
        Ok(Self {
            alphabet,
            positions,
        })
    }

    /// Upper-case latin letters.
    pub fn types() -> Self {
        Self::from_valid(TYPE_ALPHABET.chars())
    }

    /// Lower-case latin letters followed by the decimal digits.
    pub fn members() -> Self {
        Self::from_valid(MEMBER_ALPHABET.chars())
    }

    /// 4096 CJK unified ideographs starting at U+4E00.
    pub fn unicode() -> Self {
        Self::from_valid((UNICODE_FIRST..UNICODE_FIRST + UNICODE_ALPHABET_LEN).filter_map(char::from_u32))
    }

    fn from_valid(alphabet: impl Iterator<Item = char>) -> Self {
        let alphabet: Vec<char> = alphabet.collect();
        let positions = alphabet
            .iter()
            .enumerate()
            .map(|(position, ch)| (*ch, position))
            .collect();
        Self {
            alphabet,
            positions,
        }
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn contains(&self, ch: char) -> bool {
        self.positions.contains_key(&ch)
    }
}

impl NameGenerator for SequentialNameGenerator {
    fn generate(&self, previous: Option<&str>) -> String {
        let first = self.alphabet[0];
        let last = self.alphabet.len() - 1;
        let mut name: Vec<char> = match previous {
            Some(previous) if !previous.is_empty() => previous.chars().collect(),
            _ => return first.to_string(),
        };

        for slot in name.iter_mut().rev() {
            match self.positions.get(slot) {
                Some(&position) if position < last => {
                    *slot = self.alphabet[position + 1];
                    return name.into_iter().collect();
                }
                // foreign characters restart the count at this position
                None => {
                    *slot = first;
                    return name.into_iter().collect();
                }
                Some(_) => *slot = first,
            }
        }

        name.push(first);
        name.into_iter().collect()
    }
}

/// Returns a fresh 32 character UUID token on every call, ignoring the
/// previous name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomNameGenerator {
    upper_case: bool,
}

impl RandomNameGenerator {
    /// `[A-Z0-9]{32}` tokens.
    pub fn types() -> Self {
        Self { upper_case: true }
    }

    /// `[a-z0-9]{32}` tokens.
    pub fn members() -> Self {
        Self { upper_case: false }
    }
}

impl NameGenerator for RandomNameGenerator {
    fn generate(&self, _previous: Option<&str>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        if self.upper_case {
            token.to_ascii_uppercase()
        } else {
            token
        }
    }
}

/// One generator per symbol category. Each slot can be replaced on its own.
#[derive(Debug, Clone)]
pub struct NameGenerators {
    types: Arc<dyn NameGenerator>,
    fields: Arc<dyn NameGenerator>,
    methods: Arc<dyn NameGenerator>,
    dynamic_calls: Arc<dyn NameGenerator>,
}

impl Default for NameGenerators {
    fn default() -> Self {
        Self::sequential()
    }
}

impl NameGenerators {
    /// Latin type names, lower-case alphanumeric member names.
    pub fn sequential() -> Self {
        Self::split(SequentialNameGenerator::types(), SequentialNameGenerator::members())
    }

    /// Latin type names, CJK member names.
    pub fn unicode() -> Self {
        Self::split(SequentialNameGenerator::types(), SequentialNameGenerator::unicode())
    }

    pub fn random() -> Self {
        Self::split(RandomNameGenerator::types(), RandomNameGenerator::members())
    }

    fn split<T, M>(types: T, members: M) -> Self
    where
        T: NameGenerator + 'static,
        M: NameGenerator + 'static,
    {
        let members: Arc<dyn NameGenerator> = Arc::new(members);
        Self {
            types: Arc::new(types),
            fields: Arc::clone(&members),
            methods: Arc::clone(&members),
            dynamic_calls: members,
        }
    }

    /// Replaces the generator of `category`.
    pub fn with(mut self, category: Category, generator: Arc<dyn NameGenerator>) -> Self {
        match category {
            Category::Type => self.types = generator,
            Category::Field => self.fields = generator,
            Category::Method => self.methods = generator,
            Category::DynamicCall => self.dynamic_calls = generator,
        }
        self
    }

    pub fn for_category(&self, category: Category) -> &dyn NameGenerator {
        match category {
            Category::Type => self.types.as_ref(),
            Category::Field => self.fields.as_ref(),
            Category::Method => self.methods.as_ref(),
            Category::DynamicCall => self.dynamic_calls.as_ref(),
        }
    }
}

/// Last generated name per category for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameCursors {
    last: HashMap<Category, String>,
}

impl NameCursors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self, category: Category) -> Option<&str> {
        self.last.get(&category).map(String::as_str)
    }

    /// Generates the next name of `category` and records it as the last one.
    pub fn advance(&mut self, category: Category, generators: &NameGenerators) -> String {
        let next = generators
            .for_category(category)
            .generate(self.last(category));
        self.last.insert(category, next.clone());
        next
    }

    /// Forgets every recorded name.
    pub fn reset(&mut self) {
        self.last.clear();
    }
}

