macro_rules! wrap_smallstr {
    ($name:ty) => {
        impl $name {
            /// 转换为字符串切片
            #[inline]
            pub fn as_str(&self) -> &str {
                self.inner.as_str()
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(s: String) -> Self {
                Self {
                    inner: smallstr::SmallString::from(s),
                }
            }
        }

        impl<'a> From<&'a String> for $name {
            #[inline]
            fn from(s: &'a String) -> Self {
                Self {
                    inner: smallstr::SmallString::from(s.as_str()),
                }
            }
        }

        impl From<Box<str>> for $name {
            #[inline]
            fn from(s: Box<str>) -> Self {
                Self {
                    inner: smallstr::SmallString::from(s),
                }
            }
        }

        impl<'a> From<&'a str> for $name {
            #[inline]
            fn from(s: &'a str) -> Self {
                Self {
                    inner: smallstr::SmallString::from(s),
                }
            }
        }

        impl<'a> From<std::borrow::Cow<'a, str>> for $name {
            #[inline]
            fn from(s: std::borrow::Cow<'a, str>) -> Self {
                match s {
                    std::borrow::Cow::Borrowed(s) => s.into(),
                    std::borrow::Cow::Owned(s) => s.into(),
                }
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self {
                    inner: smallstr::SmallString::new(),
                }
            }
        }

        impl std::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(self.inner.as_str(), f)
            }
        }

        impl std::fmt::Debug for $name {
            #[inline]
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(self.inner.as_str(), f)
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                self.inner.as_str()
            }
        }

        impl std::borrow::Borrow<str> for $name {
            #[inline]
            fn borrow(&self) -> &str {
                self.inner.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                self.inner.as_str()
            }
        }

        impl PartialEq<str> for $name {
            #[inline]
            fn eq(&self, other: &str) -> bool {
                self.inner.as_str() == other
            }
        }

        impl<'a> PartialEq<&'a str> for $name {
            #[inline]
            fn eq(&self, other: &&'a str) -> bool {
                self.inner.as_str() == *other
            }
        }

        impl serde::Serialize for $name {
            #[inline]
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.inner.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            #[inline]
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct StrVisitor;

                impl<'de> serde::de::Visitor<'de> for StrVisitor {
                    type Value = $name;

                    #[inline]
                    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                        f.write_str("a string")
                    }

                    #[inline]
                    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                        Ok(v.into())
                    }

                    #[inline]
                    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
                        Ok(v.into())
                    }
                }

                deserializer.deserialize_str(StrVisitor)
            }
        }
    };
}
