//! 以 4 字节大端长度为前缀的帧读写
//! 帧内容对本层不透明

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Error;

const SIZE_LEN: usize = 4;

pub(crate) const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// 先写入缓冲区再一次性刷入 socket
pub(crate) async fn write_frame<W>(stream: &mut W, payload: &[u8], max: usize) -> Result<(), Error>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if payload.len() > max || payload.len() > i32::MAX as usize {
        return Err(Error::FrameTooLarge(payload.len()));
    }
    let mut write = BytesMut::with_capacity(SIZE_LEN + payload.len());
    write.put_u32(payload.len() as u32);
    write.put_slice(payload);

    stream.write_all(&write).await?;
    stream.flush().await?;
    Ok(())
}

pub(crate) async fn read_frame<R>(stream: &mut R, max: usize) -> Result<Bytes, Error>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut size = [0u8; SIZE_LEN];
    read_exact(stream, &mut size).await?;
    let len = u32::from_be_bytes(size) as usize;
    if len > max {
        return Err(Error::FrameTooLarge(len));
    }

    let mut read = BytesMut::zeroed(len);
    read_exact(stream, &mut read).await?;
    Ok(read.freeze())
}

async fn read_exact<R>(stream: &mut R, buf: &mut [u8]) -> Result<(), Error>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::ConnectionAborted),
        Err(e) => Err(Error::IO(e)),
    }
}
