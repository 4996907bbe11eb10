use bytemuck::Pod;

/// Meaning of a vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Normal,
    TexCoord,
    Joints,
    Weights,
    Color,
}

/// Scalar type of one component of an attribute element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    F32,
    U8,
    U16,
    U32,
}

impl ComponentType {
    #[inline]
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 | Self::U32 => 4,
        }
    }

    /// Largest value of an integer type, used to map normalized integers to [0, 1].
    #[inline]
    fn max_value(self) -> f32 {
        match self {
            Self::U8 => f32::from(u8::MAX),
            Self::U16 => f32::from(u16::MAX),
            Self::U32 => u32::MAX as f32,
            Self::F32 => 1.0,
        }
    }
}

/// One raw, possibly strided, vertex attribute as the source file stores it.
///
/// Element `i` starts at byte `i * stride`; components are little-endian.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeStream {
    pub semantic: Semantic,
    pub component: ComponentType,
    /// Integer components encode a [0, 1] fraction.
    pub normalized: bool,
    /// Components per element (e.g. 3 for a position).
    pub components: usize,
    /// Bytes between the starts of two consecutive elements.
    pub stride: usize,
    pub data: Vec<u8>,
}

impl AttributeStream {
    /// Builds a tightly packed stream from typed elements.
    pub fn from_iter<T, I>(semantic: Semantic, component: ComponentType, normalized: bool, iter: I) -> Self
    where
        T: Pod,
        I: IntoIterator<Item = T>,
    {
        let data: Vec<u8> = iter
            .into_iter()
            .flat_map(|v| bytemuck::bytes_of(&v).to_vec())
            .collect();

        let item_size = std::mem::size_of::<T>();

        Self {
            semantic,
            component,
            normalized,
            components: item_size / component.size(),
            stride: item_size,
            data,
        }
    }

    /// Bytes taken by the components of one element (excluding stride padding).
    #[inline]
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.components * self.component.size()
    }

    /// Minimum byte length needed to hold `count` elements.
    #[must_use]
    pub fn required_len(&self, count: usize) -> usize {
        if count == 0 {
            0
        } else {
            (count - 1) * self.stride + self.element_size()
        }
    }

    fn component_offset(&self, element: usize, component: usize) -> usize {
        element * self.stride + component * self.component.size()
    }

    /// Reads `out.len()` components of `element` as floats.
    ///
    /// Normalized integers are mapped to [0, 1]; components beyond
    /// `self.components` are left untouched. The caller checks the length
    /// with [`AttributeStream::required_len`] first.
    pub fn read_f32(&self, element: usize, out: &mut [f32]) {
        let n = out.len().min(self.components);
        for (c, slot) in out.iter_mut().enumerate().take(n) {
            let at = self.component_offset(element, c);
            let raw = match self.component {
                ComponentType::F32 => bytemuck::pod_read_unaligned::<f32>(&self.data[at..at + 4]),
                ComponentType::U8 => f32::from(self.data[at]),
                ComponentType::U16 => f32::from(bytemuck::pod_read_unaligned::<u16>(&self.data[at..at + 2])),
                ComponentType::U32 => bytemuck::pod_read_unaligned::<u32>(&self.data[at..at + 4]) as f32,
            };
            *slot = if self.normalized && self.component != ComponentType::F32 {
                raw / self.component.max_value()
            } else {
                raw
            };
        }
    }

    /// Reads `out.len()` components of `element` widened to `u32`.
    ///
    /// Float components are truncated toward zero (negative values clamp to 0).
    pub fn read_u32(&self, element: usize, out: &mut [u32]) {
        let n = out.len().min(self.components);
        for (c, slot) in out.iter_mut().enumerate().take(n) {
            let at = self.component_offset(element, c);
            *slot = match self.component {
                ComponentType::U8 => u32::from(self.data[at]),
                ComponentType::U16 => u32::from(bytemuck::pod_read_unaligned::<u16>(&self.data[at..at + 2])),
                ComponentType::U32 => bytemuck::pod_read_unaligned::<u32>(&self.data[at..at + 4]),
                ComponentType::F32 => bytemuck::pod_read_unaligned::<f32>(&self.data[at..at + 4]).max(0.0) as u32,
            };
        }
    }
}
